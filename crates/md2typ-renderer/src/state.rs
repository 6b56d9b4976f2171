//! Mutable state threaded through one render call.

use crate::directive::{Directive, ImageMeta, TableMeta};

/// Directive-driven render state.
///
/// Pending metadata behaves as a slot of size one: a later directive of the
/// same kind overwrites it, and consuming it leaves the slot empty.
#[derive(Clone, Debug, Default)]
pub(crate) struct RenderState {
    /// Inside an exclusion range.
    excluding: bool,
    /// Next code block is emitted verbatim.
    pending_raw: bool,
    pending_table_meta: Option<TableMeta>,
    pending_image_meta: Option<ImageMeta>,
}

impl RenderState {
    /// Update state for a recognized directive.
    pub(crate) fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::BeginExclude => self.excluding = true,
            Directive::EndExclude => self.excluding = false,
            Directive::Table(meta) => self.pending_table_meta = Some(meta),
            Directive::Image(meta) => self.pending_image_meta = Some(meta),
            Directive::RawTypst => self.pending_raw = true,
        }
    }

    pub(crate) fn is_excluding(&self) -> bool {
        self.excluding
    }

    /// Consume the raw-passthrough flag.
    pub(crate) fn take_raw(&mut self) -> bool {
        std::mem::take(&mut self.pending_raw)
    }

    pub(crate) fn take_table_meta(&mut self) -> Option<TableMeta> {
        self.pending_table_meta.take()
    }

    pub(crate) fn take_image_meta(&mut self) -> Option<ImageMeta> {
        self.pending_image_meta.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_meta(label: &str) -> TableMeta {
        TableMeta {
            label: Some(label.to_owned()),
            ..TableMeta::default()
        }
    }

    #[test]
    fn test_exclude_toggles() {
        let mut state = RenderState::default();
        assert!(!state.is_excluding());
        state.apply(Directive::BeginExclude);
        assert!(state.is_excluding());
        state.apply(Directive::EndExclude);
        assert!(!state.is_excluding());
    }

    #[test]
    fn test_end_exclude_without_begin_is_harmless() {
        let mut state = RenderState::default();
        state.apply(Directive::EndExclude);
        assert!(!state.is_excluding());
    }

    #[test]
    fn test_repeated_begin_closed_by_single_end() {
        let mut state = RenderState::default();
        state.apply(Directive::BeginExclude);
        state.apply(Directive::BeginExclude);
        state.apply(Directive::EndExclude);
        assert!(!state.is_excluding());
    }

    #[test]
    fn test_raw_flag_consumed_once() {
        let mut state = RenderState::default();
        state.apply(Directive::RawTypst);
        state.apply(Directive::RawTypst);
        assert!(state.take_raw());
        assert!(!state.take_raw());
    }

    #[test]
    fn test_table_meta_last_wins() {
        let mut state = RenderState::default();
        state.apply(Directive::Table(table_meta("first")));
        state.apply(Directive::Table(table_meta("second")));
        assert_eq!(state.take_table_meta(), Some(table_meta("second")));
        assert_eq!(state.take_table_meta(), None);
    }

    #[test]
    fn test_image_meta_consumed_once() {
        let mut state = RenderState::default();
        state.apply(Directive::Image(ImageMeta {
            label: Some("fig".to_owned()),
        }));
        assert!(state.take_image_meta().is_some());
        assert!(state.take_image_meta().is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut parent = RenderState::default();
        parent.apply(Directive::RawTypst);
        let mut child = parent.clone();
        assert!(child.take_raw());
        assert!(parent.take_raw());
    }
}
