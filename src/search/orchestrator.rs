//! Staged search orchestration.
//!
//! One call to [`SearchOrchestrator::run_search`] issues exactly one remote
//! search and, while it is pending, walks the narration timeline and drives
//! the progress sink. The outcome is revealed only once both the remote call
//! has resolved and the minimum presentation window has elapsed. Narration
//! scheduled inside the window is always delivered before the reveal.
//!
//! ```text
//!   t=0          narration points ...            min_presentation
//!   |--------------*--------*---------*-------------|
//!   |<----------- remote call (0..max_wait) ---------------->|
//!                                                            reveal
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until, timeout};
use tracing::{debug, info, warn};

use super::client::SearchClient;
use super::progress::ProgressSink;
use super::timeline::NarrationTimeline;
use super::{SearchOutcome, SearchRequest};
use crate::errors::{SearchError, TimelineError};

/// Receives narration text as each timeline point comes due.
pub trait Narrator: Send + Sync {
    fn narrate(&self, text: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub timeline: NarrationTimeline,
    /// Shortest time between starting a search and revealing its outcome.
    pub min_presentation: Duration,
    /// Longest time to wait for the search service before giving up.
    pub max_wait: Duration,
    /// How often the progress percentage is recomputed.
    pub progress_tick: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            timeline: NarrationTimeline::standard(),
            min_presentation: Duration::from_millis(7_000),
            max_wait: Duration::from_secs(600),
            progress_tick: Duration::from_millis(100),
        }
    }
}

pub struct SearchOrchestrator {
    client: Arc<dyn SearchClient>,
    progress: Arc<dyn ProgressSink>,
    settings: OrchestratorSettings,
}

impl SearchOrchestrator {
    /// Fails when a narration point would fire at or after the end of the
    /// presentation window.
    pub fn new(
        client: Arc<dyn SearchClient>,
        progress: Arc<dyn ProgressSink>,
        settings: OrchestratorSettings,
    ) -> Result<Self, TimelineError> {
        settings.timeline.check_window(settings.min_presentation)?;
        Ok(Self {
            client,
            progress,
            settings,
        })
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run one search attempt to completion.
    ///
    /// Never retries and never fails: transport problems and timeouts come
    /// back as [`SearchOutcome::Failure`]. The progress sink is started on
    /// entry and stopped on every exit path.
    pub async fn run_search(&self, request: SearchRequest, narrator: &dyn Narrator) -> SearchOutcome {
        let started = Instant::now();
        info!(
            product = %request.product_name,
            country = %request.country,
            count = request.result_count,
            "Starting search"
        );

        let progress = ProgressGuard::start(self.progress.as_ref());
        let reveal = future::join(
            self.call_remote(&request),
            sleep_until(started + self.settings.min_presentation),
        );
        tokio::pin!(reveal);

        let mut points = self.settings.timeline.points().iter().peekable();
        let mut ticker = interval(self.settings.progress_tick.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut percent = 0u8;

        let outcome = loop {
            let next_due = points.peek().map(|point| started + point.offset);
            tokio::select! {
                biased;

                _ = sleep_until(next_due.unwrap_or(started)), if next_due.is_some() => {
                    if let Some(point) = points.next() {
                        debug!(offset_ms = point.offset.as_millis() as u64, "Narrating");
                        narrator.narrate(&point.text);
                    }
                }
                (outcome, ()) = &mut reveal => break outcome,
                _ = ticker.tick() => {
                    let current = self.presentation_percent(started.elapsed());
                    if current > percent {
                        percent = current;
                        progress.update(percent);
                    }
                }
            }
        };

        if outcome.is_success() {
            progress.update(100);
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            SearchOutcome::Success { report_reference } => {
                info!(elapsed_ms, report = %report_reference, "Search finished");
            }
            SearchOutcome::Failure { error } => {
                warn!(elapsed_ms, kind = outcome.kind(), %error, "Search failed");
            }
        }
        outcome
    }

    async fn call_remote(&self, request: &SearchRequest) -> SearchOutcome {
        match timeout(self.settings.max_wait, self.client.search(request)).await {
            Ok(Ok(response)) => response.into_outcome(),
            Ok(Err(error)) => error.into(),
            Err(_) => SearchError::TimedOut {
                waited: self.settings.max_wait,
            }
            .into(),
        }
    }

    /// Share of the presentation window that has elapsed, held below 100
    /// until the outcome is known.
    fn presentation_percent(&self, elapsed: Duration) -> u8 {
        let window = self.settings.min_presentation.as_millis().max(1);
        (elapsed.as_millis() * 100 / window).min(99) as u8
    }
}

/// Stops the progress sink when dropped.
struct ProgressGuard<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressGuard<'a> {
    fn start(sink: &'a dyn ProgressSink) -> Self {
        sink.start();
        sink.update(0);
        Self { sink }
    }

    fn update(&self, percent: u8) {
        self.sink.update(percent);
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
