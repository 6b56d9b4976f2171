//! `md2typ convert` command implementation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Args;
use md2typ_config::{CliSettings, Config};
use md2typ_meta::{HeaderGenerator, split_front_matter};
use md2typ_renderer::{IncludeResolver, MiniJinjaTemplates, TypstRenderer};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown file to convert.
    input: PathBuf,

    /// Output file (default: input with a .typ extension).
    output: Option<PathBuf>,

    /// Levels added to every heading (overrides config).
    #[arg(long)]
    heading_offset: Option<u8>,

    /// Directory with template overrides (overrides config).
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Leave `{{path}}` include lines unexpanded.
    #[arg(long)]
    no_includes: bool,

    /// Path to configuration file (default: auto-discover md2typ.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            heading_offset: self.heading_offset,
            templates_dir: self.templates_dir.clone(),
            includes_enabled: self.no_includes.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let source = std::fs::read_to_string(&self.input).map_err(|source| CliError::Read {
            path: self.input.clone(),
            source,
        })?;
        let base_dir = self.input.parent().unwrap_or(Path::new("."));
        let conversion = convert_source(&source, base_dir, &config)?;

        for warning in &conversion.warnings {
            output.warning(&format!("warning: {warning}"));
        }

        let output_path = self
            .output
            .unwrap_or_else(|| derive_output_path(&self.input));
        std::fs::write(&output_path, &conversion.typst).map_err(|source| CliError::Write {
            path: output_path.clone(),
            source,
        })?;

        output.success(&format!(
            "success: {} -> {}",
            self.input.display(),
            output_path.display()
        ));
        Ok(())
    }
}

/// Converted document.
#[derive(Debug)]
pub(crate) struct Conversion {
    /// Report header, a blank line and the rendered body.
    pub(crate) typst: String,
    /// Include and rendering warnings.
    pub(crate) warnings: Vec<String>,
}

/// Convert markdown source; includes are resolved against `base_dir`.
pub(crate) fn convert_source(
    source: &str,
    base_dir: &Path,
    config: &Config,
) -> Result<Conversion, CliError> {
    let (metadata, body) = split_front_matter(source)?;

    let mut warnings = Vec::new();
    let expanded = if config.includes.enabled {
        let result = IncludeResolver::new()
            .with_max_depth(config.includes.max_depth)
            .resolve(body, base_dir);
        warnings.extend(result.warnings);
        result.source
    } else {
        body.to_owned()
    };

    let templates_dir = config.templates_resolved.dir.as_deref();
    let templates = templates_dir.map_or_else(MiniJinjaTemplates::new, MiniJinjaTemplates::from_dir);
    let renderer =
        TypstRenderer::new(templates).with_heading_offset(config.render.heading_offset);
    let rendered = renderer.render_markdown(&expanded);
    warnings.extend(rendered.warnings);

    let header = match metadata {
        Some(meta) => templates_dir
            .map_or_else(HeaderGenerator::new, HeaderGenerator::from_dir)
            .with_report_import(config.header.report_import.as_str())
            .generate(&meta)?,
        None => String::new(),
    };

    tracing::debug!(
        bytes = rendered.typst.len(),
        warnings = warnings.len(),
        "Converted document"
    );

    Ok(Conversion {
        typst: format!("{header}\n{}", rendered.typst),
        warnings,
    })
}

/// Output path for `input`: a `.md` extension (any case) becomes `.typ`,
/// anything else gets `.typ` appended.
pub(crate) fn derive_output_path(input: &Path) -> PathBuf {
    let is_markdown = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    if is_markdown {
        return input.with_extension("typ");
    }
    let mut path = OsString::from(input.as_os_str());
    path.push(".typ");
    PathBuf::from(path)
}
