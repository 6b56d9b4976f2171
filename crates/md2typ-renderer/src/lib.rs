//! Directive-aware markdown to Typst renderer.
//!
//! Markdown is parsed with `pulldown-cmark` into an owned [`Node`] tree, then
//! walked depth-first by [`TypstRenderer`], which emits Typst markup per node
//! kind. HTML comments carrying [`Directive`] markers steer the output:
//!
//! - `<!--typst-begin-exclude-->` / `<!--typst-end-exclude-->` hide a range
//! - `<!--raw-typst-->` passes the next code block through verbatim
//! - `<!--typst-table ...-->` / `<!--typst-image ...-->` attach caption,
//!   placement, columns and labels to the next table or image
//!
//! Tables and images are rendered through [`FragmentTemplates`];
//! [`MiniJinjaTemplates`] provides built-in templates that a templates
//! directory can override.
//!
//! Nested content (block quotes, list items, table rows, image captions) is
//! rendered into its own buffer and embedded as one unit.
//!
//! # Example
//!
//! ```
//! use md2typ_renderer::{IncludeResolver, TypstRenderer};
//! use std::path::Path;
//!
//! let source = "## Results\n\n> Hello *world*";
//! let expanded = IncludeResolver::new().resolve(source, Path::new("."));
//! let result = TypstRenderer::default().render_markdown(&expanded.source);
//!
//! assert!(result.typst.starts_with("\n== Results\n"));
//! assert!(result.typst.contains("#quote(block: true)[Hello #emph[world]]"));
//! ```

pub mod directive;
mod include;
mod layout;
mod renderer;
mod state;
mod template;
pub mod tree;
mod util;

pub use directive::{Directive, ImageMeta, TableMeta};
pub use include::{DEFAULT_MAX_DEPTH, IncludeResolver, IncludeResult};
pub use layout::ColumnSpec;
pub use renderer::{DEFAULT_HEADING_OFFSET, RenderResult, TypstRenderer};
pub use template::{
    FIGURE_TEMPLATE, FigureData, FragmentTemplates, MiniJinjaTemplates, TABLE_TEMPLATE,
    TableData, TemplateError, environment,
};
pub use tree::{Node, NodeKind, parse};
pub use util::escape;
