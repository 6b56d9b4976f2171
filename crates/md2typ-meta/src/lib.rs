//! Report metadata for md2typ.
//!
//! Extracts YAML front matter from a markdown document ([`split_front_matter`])
//! and renders the Typst report preamble from it ([`HeaderGenerator`]).

mod front_matter;
mod header;

pub use front_matter::{Author, Metadata, split_front_matter};
pub use header::{DEFAULT_REPORT_IMPORT, HEADER_TEMPLATE, HeaderGenerator};

/// Error type for metadata operations.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// YAML parsing error.
    #[error("{0}")]
    Parse(String),

    /// Header template error.
    #[error("Header template error: {0}")]
    Template(#[from] minijinja::Error),
}
