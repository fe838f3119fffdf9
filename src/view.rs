use crate::render::{FormatCard, MetadataView};

/// Actionable controls the controller enables, disables and marks busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Fetch,
    Download,
}

/// Rendering surface driven by [`crate::FormController`].
///
/// The error notice is a single slot: `set_error` replaces whatever it held.
pub trait FormView {
    fn set_error(&mut self, message: &str);
    fn clear_error(&mut self);
    /// Shows the metadata panel and brings it into view.
    fn show_metadata(&mut self, metadata: &MetadataView);
    fn hide_metadata(&mut self);
    /// Replaces every previously rendered card; none starts selected.
    fn render_formats(&mut self, cards: &[FormatCard]);
    /// Marks the card with `format_id` selected and every other card not.
    fn mark_selected(&mut self, format_id: &str);
    fn set_busy(&mut self, trigger: Trigger, busy: bool);
    fn set_enabled(&mut self, trigger: Trigger, enabled: bool);
}
