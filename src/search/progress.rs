//! Presentation-only progress signal for a running search.
//!
//! The percentage tracks elapsed presentation time, not the remote
//! operation. Within one search it starts at 0, never decreases, and reaches
//! 100 only when the search succeeds.

pub trait ProgressSink: Send + Sync {
    fn start(&self);

    fn update(&self, percent: u8);

    /// Called exactly once per search, whichever way it ends.
    fn stop(&self);
}

/// A sink that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn start(&self) {}

    fn update(&self, _percent: u8) {}

    fn stop(&self) {}
}
