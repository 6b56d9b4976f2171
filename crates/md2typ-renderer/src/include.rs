//! File include preprocessing.
//!
//! A line consisting only of `{{path}}` is replaced by the contents of `path`,
//! resolved against the directory of the file containing the line. Included
//! files may include further files up to a depth limit.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Default nesting limit for includes.
pub const DEFAULT_MAX_DEPTH: usize = 10;

static INCLUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\{\{\s*([^{}]+?)\s*\}\}\s*$").unwrap());

/// Result of include resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncludeResult {
    /// Source with include lines expanded.
    pub source: String,
    /// Includes that could not be resolved.
    pub warnings: Vec<String>,
}

/// Expands include lines in markdown source.
#[derive(Clone, Copy, Debug)]
pub struct IncludeResolver {
    max_depth: usize,
}

impl Default for IncludeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IncludeResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand include lines in `source`, resolving paths against `base_dir`.
    ///
    /// Include lines inside fenced code blocks are left alone. A missing or
    /// unreadable file leaves its line untouched and records a warning.
    #[must_use]
    pub fn resolve(&self, source: &str, base_dir: &Path) -> IncludeResult {
        let mut warnings = Vec::new();
        let source = self.expand(source, base_dir, 0, &mut warnings);
        IncludeResult { source, warnings }
    }

    fn expand(
        &self,
        source: &str,
        base_dir: &Path,
        depth: usize,
        warnings: &mut Vec<String>,
    ) -> String {
        let mut result = String::with_capacity(source.len());
        let mut fence: Option<&str> = None;

        for line in source.split_inclusive('\n') {
            if let Some(marker) = fence_marker(line) {
                match fence {
                    None => fence = Some(marker),
                    Some(open) if marker.starts_with(open) => fence = None,
                    Some(_) => {}
                }
                result.push_str(line);
                continue;
            }

            let path = match INCLUDE_RE.captures(line.trim_end_matches(['\r', '\n'])) {
                Some(caps) if fence.is_none() => caps.get(1).map_or("", |m| m.as_str()),
                _ => {
                    result.push_str(line);
                    continue;
                }
            };

            if depth >= self.max_depth {
                let warning = format!(
                    "Include depth exceeded maximum of {}: '{path}'",
                    self.max_depth
                );
                tracing::warn!(path, depth, "Include depth exceeded");
                warnings.push(warning);
                result.push_str(line);
                continue;
            }

            let full_path = base_dir.join(path);
            match std::fs::read_to_string(&full_path) {
                Ok(content) => {
                    tracing::debug!(path = %full_path.display(), depth, "Including file");
                    let nested_dir = full_path.parent().unwrap_or(base_dir);
                    let expanded = self.expand(&content, nested_dir, depth + 1, warnings);
                    result.push_str(&expanded);
                    if line.ends_with('\n') && !expanded.ends_with('\n') {
                        result.push('\n');
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %full_path.display(), error = %e, "Include file not found");
                    warnings.push(format!(
                        "Include file not found: '{path}' (looked in {})",
                        full_path.display()
                    ));
                    result.push_str(line);
                }
            }
        }
        result
    }
}

/// Fence marker (run of backticks or tildes) opening or closing a code block.
fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|&c| c == first).count();
    (len >= 3).then(|| &trimmed[..len])
}
