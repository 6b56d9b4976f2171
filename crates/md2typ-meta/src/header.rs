//! Typst report header generation.

use std::path::Path;

use md2typ_renderer::environment;
use minijinja::Environment;
use serde::Serialize;

use crate::{Metadata, MetadataError};

/// Template name for the report header.
pub const HEADER_TEMPLATE: &str = "header.typ.j2";

/// Default import path of the report template package.
pub const DEFAULT_REPORT_IMPORT: &str = "../../typst-templates/report/report.typ";

const BUILTIN_TEMPLATES: &[(&str, &str)] =
    &[(HEADER_TEMPLATE, include_str!("../templates/header.typ.j2"))];

#[derive(Serialize)]
struct HeaderContext<'a> {
    report_import: &'a str,
    #[serde(flatten)]
    meta: &'a Metadata,
}

/// Renders the `#import` and `#show: report.with(...)` preamble.
pub struct HeaderGenerator {
    env: Environment<'static>,
    report_import: String,
}

impl Default for HeaderGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderGenerator {
    /// Use the built-in header template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: environment(None, BUILTIN_TEMPLATES),
            report_import: DEFAULT_REPORT_IMPORT.to_owned(),
        }
    }

    /// Prefer `header.typ.j2` from `dir` over the built-in template.
    #[must_use]
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            env: environment(Some(dir), BUILTIN_TEMPLATES),
            report_import: DEFAULT_REPORT_IMPORT.to_owned(),
        }
    }

    /// Set the path imported at the top of the header.
    #[must_use]
    pub fn with_report_import(mut self, path: impl Into<String>) -> Self {
        self.report_import = path.into();
        self
    }

    /// Render the header for `meta`.
    ///
    /// Only fields with values appear in the `report.with` call.
    pub fn generate(&self, meta: &Metadata) -> Result<String, MetadataError> {
        let template = self.env.get_template(HEADER_TEMPLATE)?;
        let header = template.render(HeaderContext {
            report_import: &self.report_import,
            meta,
        })?;
        Ok(header)
    }
}
