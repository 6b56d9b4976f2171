//! Table column layout resolution.

use std::fmt;

use crate::tree::{Node, NodeKind};

/// Column layout of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSpec {
    /// Expression given by a `typst-table` comment, used verbatim.
    Explicit(String),
    /// Column count inferred from the header row.
    Inferred(usize),
}

impl ColumnSpec {
    /// Resolve the layout for `table`.
    ///
    /// An explicit expression wins. Otherwise the cells of the first header
    /// row are counted; a table without header cells gets one column.
    #[must_use]
    pub fn resolve(table: &Node, explicit: Option<&str>) -> Self {
        if let Some(columns) = explicit {
            return Self::Explicit(columns.to_owned());
        }
        let count = find_header(table).map_or(0, count_cells);
        Self::Inferred(count.max(1))
    }

    /// Number of columns, when known.
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::Explicit(_) => None,
            Self::Inferred(count) => Some(*count),
        }
    }
}

/// Inferred layouts render as a tuple of `auto` tokens, e.g. `(auto, auto)`.
impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(columns) => f.write_str(columns),
            Self::Inferred(1) => f.write_str("(auto,)"),
            Self::Inferred(count) => {
                f.write_str("(")?;
                for i in 0..*count {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("auto")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// First `TableHeader` below `table`.
fn find_header(table: &Node) -> Option<&Node> {
    table
        .children
        .iter()
        .find_map(|child| child.find_first(&|n: &Node| n.kind == NodeKind::TableHeader))
}

/// Count `TableCell` nodes without descending into cells.
fn count_cells(node: &Node) -> usize {
    node.children
        .iter()
        .map(|child| {
            if child.kind == NodeKind::TableCell {
                1
            } else {
                count_cells(child)
            }
        })
        .sum()
}
