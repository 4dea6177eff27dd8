//! The guided conversation: message and parameter types, the transcript, and
//! the step-driven engine that interprets user input.

pub mod engine;
pub mod prompts;
pub mod transcript;

pub use engine::{ConversationEngine, EngineSettings, SearchTicket};
pub use transcript::{NullTranscriptSink, Transcript, TranscriptSink};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConversationError;
use crate::search::SearchRequest;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Bot,
    User,
}

/// One entry of the conversation transcript. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            sent_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            sent_at: Utc::now(),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// The stage of the guided conversation, which decides what input is
/// expected next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    #[default]
    Greeting,
    AwaitingProduct,
    AwaitingCountry,
    AwaitingCount,
    AwaitingConfirmation,
    Searching,
    Done,
}

impl ConversationStep {
    /// Steps in which free-text answers are collected.
    pub fn accepts_text(self) -> bool {
        matches!(
            self,
            ConversationStep::AwaitingProduct
                | ConversationStep::AwaitingCountry
                | ConversationStep::AwaitingCount
        )
    }
}

impl std::fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationStep::Greeting => write!(f, "greeting"),
            ConversationStep::AwaitingProduct => write!(f, "awaiting_product"),
            ConversationStep::AwaitingCountry => write!(f, "awaiting_country"),
            ConversationStep::AwaitingCount => write!(f, "awaiting_count"),
            ConversationStep::AwaitingConfirmation => write!(f, "awaiting_confirmation"),
            ConversationStep::Searching => write!(f, "searching"),
            ConversationStep::Done => write!(f, "done"),
        }
    }
}

/// Search parameters collected one step at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParameters {
    pub product_name: Option<String>,
    pub country: Option<String>,
    pub result_count: Option<u32>,
}

impl SearchParameters {
    pub fn is_complete(&self) -> bool {
        self.product_name.is_some() && self.country.is_some() && self.result_count.is_some()
    }

    /// Build the request handed to the search service.
    ///
    /// The request owns copies of the values, so the orchestrator never
    /// touches the engine's live parameters.
    pub fn to_request(&self, websites: &[String]) -> Result<SearchRequest, ConversationError> {
        let product_name = self
            .product_name
            .clone()
            .ok_or(ConversationError::IncompleteParameters {
                missing: "product name",
            })?;
        let country = self
            .country
            .clone()
            .ok_or(ConversationError::IncompleteParameters { missing: "country" })?;
        let result_count = self
            .result_count
            .ok_or(ConversationError::IncompleteParameters {
                missing: "result count",
            })?;

        Ok(SearchRequest {
            product_name,
            country,
            result_count,
            websites: websites.to_vec(),
        })
    }
}
