//! YAML front matter at the top of a markdown document.
//!
//! ```text
//! ---
//! title: Lab Report
//! course: Operating Systems
//! date: 2024-05-01
//! authors:
//!   - name: Kim
//!     department: Computer Science
//!     organization: Example University
//!     email: kim@example.com
//! bibliography: refs.bib
//! toc: true
//! ---
//! ```

use serde::{Deserialize, Serialize};

use crate::MetadataError;

const DELIMITER: &str = "---";

/// Report metadata from front matter.
///
/// Unknown keys are ignored; absent keys stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    /// Bibliography file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibliography: Option<String>,
    /// Insert an outline and page break after the header.
    #[serde(default)]
    pub toc: bool,
}

/// Report author.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Metadata {
    /// Parse metadata from YAML content.
    ///
    /// Empty content returns a default instance.
    pub fn from_yaml(content: &str) -> Result<Self, MetadataError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(trimmed)
            .map_err(|e| MetadataError::Parse(format!("Invalid front matter: {e}")))
    }
}

/// Split leading front matter from the markdown body.
///
/// Front matter starts with a `---` line at the very top and ends at the next
/// `---` line. Without an opening delimiter, or when the closing one is
/// missing, the whole source is returned as the body.
pub fn split_front_matter(source: &str) -> Result<(Option<Metadata>, &str), MetadataError> {
    let Some((first, rest)) = split_line(source) else {
        return Ok((None, source));
    };
    if first.trim() != DELIMITER {
        return Ok((None, source));
    }

    let mut yaml_len = 0;
    let mut remaining = rest;
    while let Some((line, after)) = split_line(remaining) {
        if line.trim() == DELIMITER {
            let metadata = Metadata::from_yaml(&rest[..yaml_len])?;
            tracing::debug!(title = ?metadata.title, "Parsed front matter");
            return Ok((Some(metadata), after));
        }
        yaml_len += remaining.len() - after.len();
        remaining = after;
    }

    tracing::debug!("Front matter not terminated, treating as body");
    Ok((None, source))
}

/// First line (without its line ending) and the text after it.
fn split_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find('\n') {
        Some(pos) => Some((text[..pos].trim_end_matches('\r'), &text[pos + 1..])),
        None => Some((text, "")),
    }
}
