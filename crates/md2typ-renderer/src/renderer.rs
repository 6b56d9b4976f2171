//! Document tree to Typst renderer.

use crate::directive::{Directive, TableMeta, is_end_exclude};
use crate::layout::ColumnSpec;
use crate::state::RenderState;
use crate::template::{FigureData, FragmentTemplates, MiniJinjaTemplates, TableData};
use crate::tree::{Node, NodeKind, parse};
use crate::util::{ensure_line_start, escape, heading_marker};

/// Default heading offset: a level-1 heading becomes `=`.
pub const DEFAULT_HEADING_OFFSET: u8 = 1;

/// Result of rendering a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered Typst source.
    pub typst: String,
    /// Warnings generated during rendering (e.g., failed templates).
    pub warnings: Vec<String>,
}

/// Renders a document tree to Typst markup.
///
/// Tables and images are rendered through a [`FragmentTemplates`]
/// implementation; everything else maps directly to Typst syntax. Directive
/// comments (see [`Directive`]) steer the output: they can hide ranges, pass
/// code blocks through verbatim and attach metadata to the next table or
/// image.
///
/// # Example
///
/// ```
/// use md2typ_renderer::TypstRenderer;
///
/// let renderer = TypstRenderer::default();
/// let result = renderer.render_markdown("**bold** and *italic*");
/// assert_eq!(result.typst, "#strong[bold] and #emph[italic]\n\n");
/// ```
pub struct TypstRenderer<T: FragmentTemplates = MiniJinjaTemplates> {
    templates: T,
    heading_offset: u8,
}

impl Default for TypstRenderer<MiniJinjaTemplates> {
    fn default() -> Self {
        Self::new(MiniJinjaTemplates::new())
    }
}

impl<T: FragmentTemplates> TypstRenderer<T> {
    /// Create a renderer using `templates` for tables and figures.
    #[must_use]
    pub fn new(templates: T) -> Self {
        Self {
            templates,
            heading_offset: DEFAULT_HEADING_OFFSET,
        }
    }

    /// Shift every heading by `offset` levels.
    #[must_use]
    pub fn with_heading_offset(mut self, offset: u8) -> Self {
        self.heading_offset = offset;
        self
    }

    #[must_use]
    pub fn heading_offset(&self) -> u8 {
        self.heading_offset
    }

    /// Render a document tree.
    #[must_use]
    pub fn render(&self, document: &Node) -> RenderResult {
        tracing::debug!(heading_offset = self.heading_offset, "Rendering document");
        let mut walker = Walker::new(self, RenderState::default());
        walker.walk(document);
        RenderResult {
            typst: walker.out,
            warnings: walker.warnings,
        }
    }

    /// Parse and render markdown text.
    #[must_use]
    pub fn render_markdown(&self, markdown: &str) -> RenderResult {
        self.render(&parse(markdown))
    }
}

/// Whether the walker descends into a node after entering it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Walk {
    Continue,
    /// Children were rendered by a capture; skip them and the exit handler.
    SkipChildren,
}

/// Depth-first walker owning one output buffer.
struct Walker<'r, T: FragmentTemplates> {
    renderer: &'r TypstRenderer<T>,
    state: RenderState,
    out: String,
    warnings: Vec<String>,
}

impl<'r, T: FragmentTemplates> Walker<'r, T> {
    fn new(renderer: &'r TypstRenderer<T>, state: RenderState) -> Self {
        Self {
            renderer,
            state,
            out: String::with_capacity(4096),
            warnings: Vec::new(),
        }
    }

    fn walk(&mut self, node: &Node) {
        if self.dispatches(node) && self.enter(node) == Walk::SkipChildren {
            return;
        }
        for child in &node.children {
            self.walk(child);
        }
        if self.dispatches(node) {
            self.exit(node);
        }
    }

    /// Excluded nodes are not dispatched, except the one ending the range.
    fn dispatches(&self, node: &Node) -> bool {
        !self.state.is_excluding() || node.raw_markup().is_some_and(is_end_exclude)
    }

    /// Render `nodes` into a separate buffer with a copy of the current state.
    ///
    /// Leading newlines and trailing whitespace are trimmed from the result.
    fn capture<'n>(&mut self, nodes: impl IntoIterator<Item = &'n Node>) -> String {
        let mut child = Walker::new(self.renderer, self.state.clone());
        for node in nodes {
            child.walk(node);
        }
        self.warnings.append(&mut child.warnings);
        child.out.trim_end().trim_start_matches('\n').to_owned()
    }

    fn enter(&mut self, node: &Node) -> Walk {
        match &node.kind {
            NodeKind::Heading(level) => {
                self.out.push('\n');
                self.out
                    .push_str(&heading_marker(*level, self.renderer.heading_offset));
                self.out.push(' ');
            }
            NodeKind::BlockQuote => {
                let body = self.capture(&node.children);
                self.out.push_str("\n#quote(block: true)[");
                self.out.push_str(&body);
                self.out.push_str("]\n");
                return Walk::SkipChildren;
            }
            NodeKind::Emphasis => self.out.push_str("#emph["),
            NodeKind::Strong => self.out.push_str("#strong["),
            NodeKind::Strikethrough => self.out.push_str("#strike["),
            NodeKind::InlineCode(code) => {
                self.out.push_str("#raw(block: false, \"");
                self.out.push_str(&escape(code));
                self.out.push_str("\")");
            }
            NodeKind::CodeBlock { literal, info } => self.code_block(literal, info),
            NodeKind::HorizontalRule => {
                ensure_line_start(&mut self.out);
                self.out.push_str("#line(length: 100%)\n");
            }
            NodeKind::List { start } => {
                ensure_line_start(&mut self.out);
                match start {
                    Some(n) => {
                        self.out.push_str("#enum(start: ");
                        self.out.push_str(&n.to_string());
                        self.out.push(',');
                    }
                    None => self.out.push_str("#list("),
                }
            }
            NodeKind::ListItem => {
                let body = self.capture(&node.children);
                self.out.push('[');
                self.out.push_str(&body);
                self.out.push_str("],\n");
                return Walk::SkipChildren;
            }
            NodeKind::Table => {
                self.table(node);
                return Walk::SkipChildren;
            }
            NodeKind::TableHeader => self.out.push_str("table.header("),
            NodeKind::TableCell => self.out.push('['),
            NodeKind::Link { destination } => {
                self.out.push_str("#link(\"");
                self.out.push_str(&escape(destination));
                self.out.push_str("\")[");
            }
            NodeKind::Image { destination } => {
                self.image(node, destination);
                return Walk::SkipChildren;
            }
            NodeKind::HtmlSpan(literal) | NodeKind::HtmlBlock(literal) => {
                if let Some(directive) = Directive::parse(literal) {
                    tracing::trace!(directive = directive.name(), "Applying directive");
                    self.state.apply(directive);
                }
            }
            NodeKind::Text(text) => self.out.push_str(text),
            NodeKind::Math { literal, display } => {
                let pad = if *display { " " } else { "" };
                self.out.push('$');
                self.out.push_str(pad);
                self.out.push_str(&escape(literal));
                self.out.push_str(pad);
                self.out.push('$');
            }
            NodeKind::Softbreak => self.out.push(' '),
            NodeKind::Hardbreak => self.out.push_str("\\ "),
            NodeKind::Document
            | NodeKind::Paragraph
            | NodeKind::TableRow
            | NodeKind::Unsupported => {}
        }
        Walk::Continue
    }

    fn exit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Heading(_) | NodeKind::TableRow => self.out.push('\n'),
            NodeKind::Paragraph => self.out.push_str("\n\n"),
            NodeKind::Emphasis
            | NodeKind::Strong
            | NodeKind::Strikethrough
            | NodeKind::Link { .. } => self.out.push(']'),
            NodeKind::List { .. } => self.out.push_str(")\n\n"),
            NodeKind::TableHeader => self.out.push_str("),\n"),
            NodeKind::TableCell => self.out.push_str("],"),
            _ => {}
        }
    }

    fn code_block(&mut self, literal: &str, info: &str) {
        ensure_line_start(&mut self.out);
        if self.state.take_raw() {
            self.out.push_str(literal);
            if !literal.ends_with('\n') {
                self.out.push('\n');
            }
            return;
        }
        self.out.push_str("#raw(block: true, ");
        if let Some(lang) = info.split_whitespace().next() {
            self.out.push_str("lang: \"");
            self.out.push_str(&escape(lang));
            self.out.push_str("\", ");
        }
        self.out.push('"');
        self.out.push_str(&escape(literal));
        self.out.push_str("\")\n");
    }

    fn table(&mut self, node: &Node) {
        let meta = self.state.take_table_meta().unwrap_or_default();
        let TableMeta {
            caption,
            placement,
            columns,
            align,
            label,
        } = meta;
        let columns = ColumnSpec::resolve(node, columns.as_deref());
        let rows: Vec<String> = node
            .children
            .iter()
            .map(|child| self.capture([child]))
            .collect();

        let data = TableData {
            caption,
            placement,
            columns: columns.to_string(),
            align,
            label,
            rows: rows.join("\n"),
        };
        ensure_line_start(&mut self.out);
        match self.renderer.templates.render_table(&data) {
            Ok(fragment) => self.out.push_str(&fragment),
            Err(e) => {
                tracing::warn!(error = %e, "Table template failed");
                self.warnings.push(format!("Table template failed: {e}"));
                self.out.push_str("#table( ... )\n");
            }
        }
    }

    fn image(&mut self, node: &Node, destination: &str) {
        let caption = self.capture(&node.children);
        let label = self.state.take_image_meta().and_then(|meta| meta.label);
        let data = FigureData {
            image_path: destination.to_owned(),
            caption,
            label,
        };
        match self.renderer.templates.render_figure(&data) {
            Ok(fragment) => self.out.push_str(&fragment),
            Err(e) => {
                tracing::warn!(error = %e, path = destination, "Figure template failed");
                self.warnings.push(format!("Figure template failed for {destination}: {e}"));
                self.out.push_str("#figure( image: \"");
                self.out.push_str(&escape(destination));
                self.out.push_str("\" )\n");
            }
        }
    }
}
