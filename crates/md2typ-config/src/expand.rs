//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Supports:
/// - `${VAR}` - expands to the value of VAR, errors if unset
/// - `${VAR:-default}` - expands to VAR if set, otherwise uses default
///
/// Strings without `${` are returned unchanged, so bare `$VAR` and literal
/// dollar signs in paths are left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MD2TYP_TEST_TEMPLATES", "/opt/templates");
        }
        let result = expand_env("${MD2TYP_TEST_TEMPLATES}", "templates.dir").unwrap();
        assert_eq!(result, "/opt/templates");
        unsafe {
            std::env::remove_var("MD2TYP_TEST_TEMPLATES");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MD2TYP_TEST_UNSET");
        }
        let result = expand_env("${MD2TYP_TEST_UNSET:-report.typ}", "header.report_import").unwrap();
        assert_eq!(result, "report.typ");
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MD2TYP_TEST_ROOT", "/srv/typst");
        }
        let result = expand_env("${MD2TYP_TEST_ROOT}/report/report.typ", "header.report_import")
            .unwrap();
        assert_eq!(result, "/srv/typst/report/report.typ");
        unsafe {
            std::env::remove_var("MD2TYP_TEST_ROOT");
        }
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MD2TYP_TEST_MISSING");
        }
        let err = expand_env("${MD2TYP_TEST_MISSING}", "templates.dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MD2TYP_TEST_MISSING"));
        assert!(err.to_string().contains("templates.dir"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("templates/$draft", "templates.dir").unwrap();
        assert_eq!(result, "templates/$draft");
    }
}
