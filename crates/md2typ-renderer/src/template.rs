//! Template rendering for table and figure fragments.
//!
//! The renderer hands a flat field set ([`TableData`], [`FigureData`]) to a
//! [`FragmentTemplates`] implementation and embeds whatever text comes back.
//! [`MiniJinjaTemplates`] ships built-in templates; a templates directory can
//! override any of them by file name.

use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind};
use serde::Serialize;

use crate::util::escape;

/// Template name for tables.
pub const TABLE_TEMPLATE: &str = "table.typ.j2";
/// Template name for figures.
pub const FIGURE_TEMPLATE: &str = "figure.typ.j2";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (TABLE_TEMPLATE, include_str!("../templates/table.typ.j2")),
    (FIGURE_TEMPLATE, include_str!("../templates/figure.typ.j2")),
];

/// Fields available to the table template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableData {
    pub caption: Option<String>,
    pub placement: String,
    /// Resolved column layout expression.
    pub columns: String,
    pub align: Option<String>,
    pub label: Option<String>,
    /// Rendered header and rows, one per line.
    pub rows: String,
}

/// Fields available to the figure template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FigureData {
    /// Image destination, unescaped.
    pub image_path: String,
    /// Rendered alt content.
    pub caption: String,
    pub label: Option<String>,
}

/// Template error.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Render(#[from] minijinja::Error),
}

/// Renders table and figure fragments.
///
/// Empty or absent fields must be omitted from the output, never reported as
/// errors.
pub trait FragmentTemplates {
    /// Render a table fragment.
    fn render_table(&self, data: &TableData) -> Result<String, TemplateError>;

    /// Render a figure fragment.
    fn render_figure(&self, data: &FigureData) -> Result<String, TemplateError>;
}

/// [`FragmentTemplates`] backed by `minijinja`.
pub struct MiniJinjaTemplates {
    env: Environment<'static>,
}

impl MiniJinjaTemplates {
    /// Use the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: environment(None, BUILTIN_TEMPLATES),
        }
    }

    /// Prefer templates found in `dir`, falling back to the built-ins.
    #[must_use]
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            env: environment(Some(&dir), BUILTIN_TEMPLATES),
        }
    }

    fn render(&self, name: &str, data: &impl Serialize) -> Result<String, TemplateError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(data)?)
    }
}

impl Default for MiniJinjaTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentTemplates for MiniJinjaTemplates {
    fn render_table(&self, data: &TableData) -> Result<String, TemplateError> {
        self.render(TABLE_TEMPLATE, data)
    }

    fn render_figure(&self, data: &FigureData) -> Result<String, TemplateError> {
        self.render(FIGURE_TEMPLATE, data)
    }
}

/// Build a Typst template environment.
///
/// Templates are loaded lazily: a file named after the template in `dir`
/// wins, otherwise the matching entry of `builtins` is used. Output is never
/// auto-escaped; the `typst_escape` filter escapes string literal content.
#[must_use]
pub fn environment(
    dir: Option<&Path>,
    builtins: &'static [(&'static str, &'static str)],
) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_filter("typst_escape", typst_escape);

    let dir = dir.map(Path::to_path_buf);
    env.set_loader(move |name| {
        if let Some(dir) = &dir {
            let path = dir.join(name);
            match std::fs::read_to_string(&path) {
                Ok(source) => {
                    tracing::debug!(path = %path.display(), "Loaded template override");
                    return Ok(Some(source));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        format!("cannot read template {}", path.display()),
                    )
                    .with_source(e));
                }
            }
        }
        Ok(builtins
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, source)| (*source).to_owned()))
    });
    env
}

fn typst_escape(value: &str) -> String {
    escape(value)
}
