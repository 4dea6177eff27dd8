//! Typed error hierarchy for procure.
//!
//! Four enums cover the layers of a conversation:
//! - `ValidationError`: rejected user input, recovered in place by re-prompting
//! - `ConversationError`: misuse of the conversation state machine
//! - `SearchError`: a remote search attempt that did not produce a report
//! - `TimelineError`: an inconsistent narration schedule

use std::time::Duration;

use thiserror::Error;

use crate::conversation::ConversationStep;

/// Why a result count answer was not accepted.
///
/// The `Display` text is what the assistant says back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid number.")]
    NotANumber,

    #[error("Please enter a number greater than zero.")]
    NotPositive,

    #[error("Please enter a number no larger than {max}.")]
    TooLarge { max: u32 },
}

/// Errors from driving the conversation through an operation its current
/// step does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Unexpected {action} in step {step}")]
    UnexpectedStep {
        action: &'static str,
        step: ConversationStep,
    },

    #[error("A search is already in progress for this conversation")]
    SearchInProgress,

    #[error("Search parameters are incomplete: missing {missing}")]
    IncompleteParameters { missing: &'static str },
}

/// Errors from a single remote search attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The service answered but reported a failure.
    #[error("Search service reported an error: {message}")]
    Application { message: String },

    /// The exchange with the service could not be completed.
    #[error("Search request failed: {0}")]
    Transport(String),

    #[error("Search service did not answer within {}s", .waited.as_secs())]
    TimedOut { waited: Duration },
}

impl SearchError {
    /// Whether the failure came from the service itself rather than from
    /// getting a response out of it.
    pub fn is_application(&self) -> bool {
        matches!(self, SearchError::Application { .. })
    }
}

/// Errors from building a narration timeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error(
        "Narration point {index} at {}ms does not come after the previous point",
        .offset.as_millis()
    )]
    NotIncreasing { index: usize, offset: Duration },

    #[error(
        "Narration point {index} at {}ms falls outside the {}ms presentation window",
        .offset.as_millis(),
        .window.as_millis()
    )]
    OutsideWindow {
        index: usize,
        offset: Duration,
        window: Duration,
    },
}
