//! Remote search: the request payload, the client seam, the narration
//! timeline and the orchestrator that runs one search attempt.

pub mod client;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod timeline;

pub use client::{HttpSearchClient, ResponseStatus, SearchClient, SearchResponse};
pub use orchestrator::{Narrator, OrchestratorSettings, SearchOrchestrator};
pub use outcome::SearchOutcome;
pub use progress::{NullProgressSink, ProgressSink};
pub use timeline::{NarrationPoint, NarrationTimeline};

use serde::{Deserialize, Serialize};

/// Completed search parameters as sent to the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub product_name: String,
    pub country: String,
    pub result_count: u32,
    /// Stores to search; the service falls back to its own list when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub websites: Vec<String>,
}
