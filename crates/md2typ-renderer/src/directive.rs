//! Directive comments embedded in markdown as HTML comments.
//!
//! Five forms are recognized, checked in this order:
//!
//! ```text
//! <!--typst-begin-exclude-->
//! <!--typst-end-exclude-->
//! <!--typst-table
//! caption: "Results"
//! placement: auto
//! columns: (1fr, 2fr)
//! align: center
//! label: results
//! -->
//! <!--typst-image
//! label: cat
//! -->
//! <!--raw-typst-->
//! ```
//!
//! Meta bodies run from the marker to the first `-->` after it, or to the
//! end of the comment when it is unterminated. Lines without a `:` and
//! unknown keys are ignored.

const BEGIN_EXCLUDE: &str = "<!--typst-begin-exclude";
const END_EXCLUDE: &str = "<!--typst-end-exclude";
const TABLE_META: &str = "<!--typst-table";
const IMAGE_META: &str = "<!--typst-image";
const RAW_TYPST: &str = "<!--raw-typst";
const COMMENT_END: &str = "-->";

/// Default table placement.
pub const DEFAULT_PLACEMENT: &str = "none";

/// Table settings carried by a `typst-table` comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableMeta {
    /// Figure caption content.
    pub caption: Option<String>,
    /// Figure placement expression.
    pub placement: String,
    /// Column layout expression. `None` infers it from the header row.
    pub columns: Option<String>,
    /// Alignment expression.
    pub align: Option<String>,
    /// Label identifier, emitted as `<tab:label>`.
    pub label: Option<String>,
}

impl Default for TableMeta {
    fn default() -> Self {
        Self {
            caption: None,
            placement: DEFAULT_PLACEMENT.to_owned(),
            columns: None,
            align: None,
            label: None,
        }
    }
}

impl TableMeta {
    /// Parse a `key: value` body.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let mut meta = Self::default();
        for (key, value) in fields(body) {
            match key {
                "caption" => meta.caption = Some(value.to_owned()),
                "placement" => value.clone_into(&mut meta.placement),
                "columns" => meta.columns = Some(value.to_owned()),
                "align" => meta.align = Some(value.to_owned()),
                "label" => meta.label = Some(value.to_owned()),
                _ => {}
            }
        }
        meta
    }
}

/// Image settings carried by a `typst-image` comment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageMeta {
    /// Label identifier, emitted as `<fig:label>`.
    pub label: Option<String>,
}

impl ImageMeta {
    /// Parse a `key: value` body. Only `label` is recognized.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let label = fields(body)
            .filter(|(key, _)| *key == "label")
            .map(|(_, value)| value.to_owned())
            .last();
        Self { label }
    }
}

/// Parsed directive comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Start of an exclusion range.
    BeginExclude,
    /// End of an exclusion range.
    EndExclude,
    /// Metadata for the next table.
    Table(TableMeta),
    /// Metadata for the next image.
    Image(ImageMeta),
    /// Emit the next code block verbatim.
    RawTypst,
}

impl Directive {
    /// Recognize a directive in raw comment text.
    ///
    /// Returns `None` for comments that carry no recognized marker.
    #[must_use]
    pub fn parse(literal: &str) -> Option<Self> {
        if literal.contains(BEGIN_EXCLUDE) {
            return Some(Self::BeginExclude);
        }
        if is_end_exclude(literal) {
            return Some(Self::EndExclude);
        }
        if let Some(body) = meta_body(literal, TABLE_META) {
            return Some(Self::Table(TableMeta::parse(body)));
        }
        if let Some(body) = meta_body(literal, IMAGE_META) {
            return Some(Self::Image(ImageMeta::parse(body)));
        }
        if literal.contains(RAW_TYPST) {
            return Some(Self::RawTypst);
        }
        None
    }

    /// Short name for log output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginExclude => "begin-exclude",
            Self::EndExclude => "end-exclude",
            Self::Table(_) => "table",
            Self::Image(_) => "image",
            Self::RawTypst => "raw-typst",
        }
    }
}

/// Check whether raw comment text carries the end-exclude marker.
#[must_use]
pub(crate) fn is_end_exclude(literal: &str) -> bool {
    literal.contains(END_EXCLUDE)
}

/// Text between `marker` and the next `-->`, or the rest of the string.
fn meta_body<'a>(literal: &'a str, marker: &str) -> Option<&'a str> {
    let start = literal.find(marker)? + marker.len();
    let rest = &literal[start..];
    let end = rest.find(COMMENT_END).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Iterate non-empty `key: value` pairs with surrounding quotes stripped.
fn fields(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.lines().filter_map(|line| {
        let (key, value) = line.trim().split_once(':')?;
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            return None;
        }
        Some((key.trim(), value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_exclude_markers() {
        assert_eq!(
            Directive::parse("<!--typst-begin-exclude-->"),
            Some(Directive::BeginExclude)
        );
        assert_eq!(
            Directive::parse("<!--typst-end-exclude-->\n"),
            Some(Directive::EndExclude)
        );
    }

    #[test]
    fn test_parse_raw_typst() {
        assert_eq!(Directive::parse("<!--raw-typst-->"), Some(Directive::RawTypst));
    }

    #[test]
    fn test_unrelated_comment_is_inert() {
        assert_eq!(Directive::parse("<!-- just a note -->"), None);
        assert_eq!(Directive::parse("<br>"), None);
    }

    #[test]
    fn test_begin_exclude_wins_over_other_markers() {
        let literal = "<!--typst-begin-exclude--><!--raw-typst-->";
        assert_eq!(Directive::parse(literal), Some(Directive::BeginExclude));
    }

    #[test]
    fn test_parse_full_table_meta() {
        let literal = "<!--typst-table\ncaption: \"Survey results\"\nplacement: top\ncolumns: (1fr, 2fr)\nalign: center\nlabel: survey\n-->";
        let expected = TableMeta {
            caption: Some("Survey results".to_owned()),
            placement: "top".to_owned(),
            columns: Some("(1fr, 2fr)".to_owned()),
            align: Some("center".to_owned()),
            label: Some("survey".to_owned()),
        };
        assert_eq!(Directive::parse(literal), Some(Directive::Table(expected)));
    }

    #[test]
    fn test_table_meta_defaults() {
        let meta = TableMeta::parse("\ncaption: Only caption\n");
        assert_eq!(meta.caption.as_deref(), Some("Only caption"));
        assert_eq!(meta.placement, "none");
        assert!(meta.columns.is_none());
        assert!(meta.align.is_none());
        assert!(meta.label.is_none());
    }

    #[test]
    fn test_table_meta_ignores_unknown_and_malformed_lines() {
        let meta = TableMeta::parse("\ncolor: red\nno colon here\nlabel: t1\n");
        assert_eq!(meta.label.as_deref(), Some("t1"));
        assert_eq!(meta, TableMeta {
            label: Some("t1".to_owned()),
            ..TableMeta::default()
        });
    }

    #[test]
    fn test_value_keeps_inner_colons() {
        let meta = TableMeta::parse("caption: \"Ratio: 1:2\"");
        assert_eq!(meta.caption.as_deref(), Some("Ratio: 1:2"));
    }

    #[test]
    fn test_empty_value_keeps_default() {
        let meta = TableMeta::parse("placement:\ncolumns: \"\"");
        assert_eq!(meta.placement, "none");
        assert!(meta.columns.is_none());
    }

    #[test]
    fn test_unterminated_table_meta_reads_to_end() {
        let Some(Directive::Table(meta)) = Directive::parse("<!--typst-table\nlabel: open") else {
            panic!("expected table directive");
        };
        assert_eq!(meta.label.as_deref(), Some("open"));
    }

    #[test]
    fn test_body_stops_at_first_comment_end() {
        let literal = "<!--typst-table\nlabel: a\n-->\nlabel: b\n";
        let Some(Directive::Table(meta)) = Directive::parse(literal) else {
            panic!("expected table directive");
        };
        assert_eq!(meta.label.as_deref(), Some("a"));
    }

    #[test]
    fn test_single_line_meta() {
        let Some(Directive::Image(meta)) = Directive::parse("<!--typst-image label: fig1-->")
        else {
            panic!("expected image directive");
        };
        assert_eq!(meta.label.as_deref(), Some("fig1"));
    }

    #[test]
    fn test_image_meta_only_reads_label() {
        let meta = ImageMeta::parse("\ncaption: ignored\nlabel: \"fig2\"\n");
        assert_eq!(meta, ImageMeta {
            label: Some("fig2".to_owned())
        });
    }

    #[test]
    fn test_image_meta_without_label() {
        assert_eq!(ImageMeta::parse("\n"), ImageMeta::default());
    }

    #[test]
    fn test_directive_names() {
        assert_eq!(Directive::BeginExclude.name(), "begin-exclude");
        assert_eq!(Directive::Image(ImageMeta::default()).name(), "image");
    }
}
