//! Configuration management for md2typ.
//!
//! Parses `md2typ.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [render]
//! heading_offset = 1
//!
//! [templates]
//! dir = "templates"
//!
//! [header]
//! report_import = "../../typst-templates/report/report.typ"
//!
//! [includes]
//! enabled = true
//! max_depth = 10
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `templates.dir` and `header.report_import` support `${VAR}` and
//! `${VAR:-default}`.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override heading offset.
    pub heading_offset: Option<u8>,
    /// Override templates directory.
    pub templates_dir: Option<PathBuf>,
    /// Override include expansion.
    pub includes_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "md2typ.toml";

/// Default import path of the report template package.
pub const DEFAULT_REPORT_IMPORT: &str = "../../typst-templates/report/report.typ";

const MAX_HEADING_OFFSET: u8 = 6;
const MAX_INCLUDE_DEPTH: usize = 32;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rendering configuration.
    pub render: RenderConfig,
    /// Templates configuration (paths are relative strings from TOML).
    templates: TemplatesConfigRaw,
    /// Report header configuration.
    pub header: HeaderConfig,
    /// Include expansion configuration.
    pub includes: IncludesConfig,

    /// Resolved templates configuration (set after loading).
    #[serde(skip)]
    pub templates_resolved: TemplatesConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Levels added to every heading; 1 maps `#` to `=`.
    pub heading_offset: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { heading_offset: 1 }
    }
}

/// Raw templates configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TemplatesConfigRaw {
    dir: Option<String>,
}

/// Resolved templates configuration with absolute paths.
#[derive(Debug, Default)]
pub struct TemplatesConfig {
    /// Directory with template overrides. `None` uses built-in templates only.
    pub dir: Option<PathBuf>,
}

/// Report header configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Path written into the header's `#import`, relative to the output file.
    pub report_import: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            report_import: DEFAULT_REPORT_IMPORT.to_owned(),
        }
    }
}

/// Include expansion configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IncludesConfig {
    /// Whether `{{path}}` lines are expanded.
    pub enabled: bool,
    /// Maximum include nesting.
    pub max_depth: usize,
}

impl Default for IncludesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 10,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`templates.dir`").
        field: String,
        /// Error message (e.g., "${`TEMPLATES`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `md2typ.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// a value is out of range.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(offset) = settings.heading_offset {
            self.render.heading_offset = offset;
        }
        if let Some(dir) = &settings.templates_dir {
            self.templates_resolved.dir = Some(dir.clone());
        }
        if let Some(enabled) = settings.includes_enabled {
            self.includes.enabled = enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let offset = self.render.heading_offset;
        if !(1..=MAX_HEADING_OFFSET).contains(&offset) {
            return Err(ConfigError::Validation(format!(
                "render.heading_offset must be between 1 and {MAX_HEADING_OFFSET}, got {offset}"
            )));
        }

        let depth = self.includes.max_depth;
        if !(1..=MAX_INCLUDE_DEPTH).contains(&depth) {
            return Err(ConfigError::Validation(format!(
                "includes.max_depth must be between 1 and {MAX_INCLUDE_DEPTH}, got {depth}"
            )));
        }

        require_non_empty(&self.header.report_import, "header.report_import")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.header.report_import =
            expand::expand_env(&self.header.report_import, "header.report_import")?;

        if let Some(ref dir) = self.templates.dir {
            self.templates.dir = Some(expand::expand_env(dir, "templates.dir")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.templates_resolved = TemplatesConfig {
            dir: self.templates.dir.as_deref().map(|dir| config_dir.join(dir)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.heading_offset, 1);
        assert_eq!(config.header.report_import, DEFAULT_REPORT_IMPORT);
        assert!(config.includes.enabled);
        assert_eq!(config.includes.max_depth, 10);
        assert!(config.templates_resolved.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.render.heading_offset, 1);
        assert!(config.includes.enabled);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[render]
heading_offset = 2

[templates]
dir = "my-templates"

[header]
report_import = "report.typ"

[includes]
enabled = false
max_depth = 4
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.render.heading_offset, 2);
        assert_eq!(config.templates.dir.as_deref(), Some("my-templates"));
        assert_eq!(config.header.report_import, "report.typ");
        assert!(!config.includes.enabled);
        assert_eq!(config.includes.max_depth, 4);
    }

    #[test]
    fn test_load_resolves_templates_dir() {
        let (dir, path) = write_config("[templates]\ndir = \"templates\"\n");
        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(
            config.templates_resolved.dir,
            Some(dir.path().join("templates"))
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/md2typ.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_dir, path) = write_config("[render\nheading_offset = 1");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_heading_offset_out_of_range() {
        let (_dir, path) = write_config("[render]\nheading_offset = 7\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("render.heading_offset"));
    }

    #[test]
    fn test_load_rejects_zero_max_depth() {
        let (_dir, path) = write_config("[includes]\nmax_depth = 0\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("includes.max_depth"));
    }

    #[test]
    fn test_validate_empty_report_import() {
        let mut config = Config::default();
        config.header.report_import = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("header.report_import cannot be empty"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let (_dir, path) = write_config("[render]\nheading_offset = 2\n");
        let settings = CliSettings {
            heading_offset: Some(3),
            templates_dir: Some(PathBuf::from("/custom/templates")),
            includes_enabled: Some(false),
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();
        assert_eq!(config.render.heading_offset, 3);
        assert_eq!(
            config.templates_resolved.dir,
            Some(PathBuf::from("/custom/templates"))
        );
        assert!(!config.includes.enabled);
    }

    #[test]
    fn test_cli_settings_are_validated() {
        let (_dir, path) = write_config("");
        let settings = CliSettings {
            heading_offset: Some(0),
            ..CliSettings::default()
        };
        assert!(Config::load(Some(&path), Some(&settings)).is_err());
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let (_dir, path) = write_config("[render]\nheading_offset = 2\n");
        let config = Config::load(Some(&path), Some(&CliSettings::default())).unwrap();
        assert_eq!(config.render.heading_offset, 2);
        assert!(config.includes.enabled);
    }

    #[test]
    fn test_expand_env_vars_on_load() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MD2TYP_TEST_REPORT", "/srv/report.typ");
        }
        let (_dir, path) = write_config(
            "[header]\nreport_import = \"${MD2TYP_TEST_REPORT}\"\n\n[templates]\ndir = \"${MD2TYP_TEST_TPL_UNSET:-tpl}\"\n",
        );
        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.header.report_import, "/srv/report.typ");
        assert!(config.templates_resolved.dir.unwrap().ends_with("tpl"));
        unsafe {
            std::env::remove_var("MD2TYP_TEST_REPORT");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MD2TYP_TEST_NOPE");
        }
        let (_dir, path) = write_config("[templates]\ndir = \"${MD2TYP_TEST_NOPE}\"\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
    }
}
