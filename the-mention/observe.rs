//! Fire-and-forget reporting of non-fatal engine events.

pub const SEARCH_FAILED: &str = "mention.search_failed";
pub const SELECTED: &str = "mention.selected";

pub trait Observer: Send + Sync {
  fn record(&self, event: &str, attributes: &[(&str, String)]);
}

/// Emits every event as a `tracing` info event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
  fn record(&self, event: &str, attributes: &[(&str, String)]) {
    tracing::info!(target: "the_mention::observe", event, ?attributes);
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
  fn record(&self, _event: &str, _attributes: &[(&str, String)]) {}
}
