//! Owned document tree built from `pulldown-cmark` events.
//!
//! The renderer needs random access to subtrees (captures, header search), so
//! the flat event stream is folded into a tree of [`Node`]s first. The shape is
//! normalized so every table reads Table → (TableHeader → TableRow | TableRow)
//! → TableCell, regardless of how the parser groups header cells.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::util::heading_level_to_num;

/// Kind of a document tree node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a parsed document.
    Document,
    /// Heading with level 1-6.
    Heading(u8),
    Paragraph,
    BlockQuote,
    Emphasis,
    Strong,
    Strikethrough,
    /// Inline code span.
    InlineCode(String),
    /// Fenced or indented code block.
    CodeBlock {
        /// Code content, including the trailing newline.
        literal: String,
        /// Fence info string (empty for indented blocks).
        info: String,
    },
    HorizontalRule,
    /// List; ordered when `start` is set.
    List { start: Option<u64> },
    ListItem,
    Table,
    TableHeader,
    TableRow,
    TableCell,
    Link { destination: String },
    /// Image; children hold the alt content.
    Image { destination: String },
    /// Inline raw HTML.
    HtmlSpan(String),
    /// Block of raw HTML lines.
    HtmlBlock(String),
    Text(String),
    /// Inline (`$..$`) or display (`$$..$$`) math.
    Math { literal: String, display: bool },
    Softbreak,
    Hardbreak,
    /// Parser construct outside the supported set. Children are kept.
    Unsupported,
}

/// Node in the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a childless node.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Literal of a raw markup node (`HtmlSpan` or `HtmlBlock`).
    #[must_use]
    pub fn raw_markup(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::HtmlSpan(literal) | NodeKind::HtmlBlock(literal) => Some(literal),
            _ => None,
        }
    }

    /// First node in pre-order (self included) matching `pred`.
    ///
    /// Stops at the first match without visiting the rest of the tree.
    #[must_use]
    pub fn find_first(&self, pred: &impl Fn(&Node) -> bool) -> Option<&Node> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_first(pred))
    }
}

/// Parser options for the report dialect: tables, strikethrough and math.
#[must_use]
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_MATH
}

/// Parse markdown into a document tree.
#[must_use]
pub fn parse(markdown: &str) -> Node {
    build(Parser::new_ext(markdown, parser_options()))
}

/// Fold a stream of markdown events into a document tree.
pub fn build<'a, I>(events: I) -> Node
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut builder = TreeBuilder::new();
    for event in events {
        builder.event(event);
    }
    builder.finish()
}

/// Stack-based tree builder. The bottom frame is always the document.
struct TreeBuilder {
    stack: Vec<Node>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Node::new(NodeKind::Document)],
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.leaf(NodeKind::InlineCode(code.into_string())),
            Event::InlineMath(math) => self.leaf(NodeKind::Math {
                literal: math.into_string(),
                display: false,
            }),
            Event::DisplayMath(math) => self.leaf(NodeKind::Math {
                literal: math.into_string(),
                display: true,
            }),
            Event::Html(html) => self.html(&html),
            Event::InlineHtml(html) => self.leaf(NodeKind::HtmlSpan(html.into_string())),
            Event::SoftBreak => self.leaf(NodeKind::Softbreak),
            Event::HardBreak => self.leaf(NodeKind::Hardbreak),
            Event::Rule => self.leaf(NodeKind::HorizontalRule),
            Event::FootnoteReference(_) | Event::TaskListMarker(_) => {
                self.leaf(NodeKind::Unsupported);
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let kind = match tag {
            Tag::Paragraph => NodeKind::Paragraph,
            Tag::Heading { level, .. } => NodeKind::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => NodeKind::BlockQuote,
            Tag::CodeBlock(kind) => NodeKind::CodeBlock {
                literal: String::new(),
                info: match kind {
                    CodeBlockKind::Fenced(info) => info.into_string(),
                    CodeBlockKind::Indented => String::new(),
                },
            },
            Tag::HtmlBlock => NodeKind::HtmlBlock(String::new()),
            Tag::List(start) => NodeKind::List { start },
            Tag::Item => NodeKind::ListItem,
            Tag::Table(_) => NodeKind::Table,
            Tag::TableHead => {
                // Header cells arrive without a row; give them one.
                self.stack.push(Node::new(NodeKind::TableHeader));
                NodeKind::TableRow
            }
            Tag::TableRow => NodeKind::TableRow,
            Tag::TableCell => NodeKind::TableCell,
            Tag::Emphasis => NodeKind::Emphasis,
            Tag::Strong => NodeKind::Strong,
            Tag::Strikethrough => NodeKind::Strikethrough,
            Tag::Link { dest_url, .. } => NodeKind::Link {
                destination: dest_url.into_string(),
            },
            Tag::Image { dest_url, .. } => NodeKind::Image {
                destination: dest_url.into_string(),
            },
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript
            | Tag::MetadataBlock(_) => NodeKind::Unsupported,
        };
        self.stack.push(Node::new(kind));
    }

    fn end(&mut self, tag: TagEnd) {
        self.close();
        if tag == TagEnd::TableHead {
            self.close();
        }
    }

    /// Pop the innermost open node and attach it to its parent.
    fn close(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(node) = self.stack.pop()
            && let Some(parent) = self.stack.last_mut()
        {
            parent.children.push(node);
        }
    }

    fn leaf(&mut self, kind: NodeKind) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(Node::new(kind));
        }
    }

    fn text(&mut self, text: &str) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        if let NodeKind::CodeBlock { literal, .. } = &mut top.kind {
            literal.push_str(text);
            return;
        }
        if let Some(Node {
            kind: NodeKind::Text(existing),
            ..
        }) = top.children.last_mut()
        {
            existing.push_str(text);
            return;
        }
        top.children.push(Node::new(NodeKind::Text(text.to_owned())));
    }

    fn html(&mut self, html: &str) {
        match self.stack.last_mut() {
            Some(Node {
                kind: NodeKind::HtmlBlock(literal),
                ..
            }) => literal.push_str(html),
            _ => self.leaf(NodeKind::HtmlBlock(html.to_owned())),
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack
            .pop()
            .unwrap_or_else(|| Node::new(NodeKind::Document))
    }
}
