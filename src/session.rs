//! A conversation wired to its search orchestrator.
//!
//! [`Conversation`] is what front ends drive. It adds the timing the engine
//! leaves out: the pause between the greeting and the first question, and
//! the staged search run between `confirm` and the terminal message.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::conversation::{
    ConversationEngine, ConversationStep, EngineSettings, Message, SearchParameters, SearchTicket,
    TranscriptSink,
};
use crate::errors::{ConversationError, TimelineError};
use crate::search::{
    Narrator, OrchestratorSettings, ProgressSink, SearchClient, SearchOrchestrator, SearchOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSettings {
    pub engine: EngineSettings,
    pub orchestrator: OrchestratorSettings,
    /// Pause between the greeting and the first question.
    pub greeting_delay: Duration,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            orchestrator: OrchestratorSettings::default(),
            greeting_delay: Duration::from_millis(1_000),
        }
    }
}

pub struct Conversation {
    engine: Mutex<ConversationEngine>,
    orchestrator: SearchOrchestrator,
    greeting_delay: Duration,
}

impl Conversation {
    pub fn new(
        settings: ConversationSettings,
        client: Arc<dyn SearchClient>,
        transcript: Arc<dyn TranscriptSink>,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Self, TimelineError> {
        let orchestrator = SearchOrchestrator::new(client, progress, settings.orchestrator)?;
        Ok(Self {
            engine: Mutex::new(ConversationEngine::new(settings.engine, transcript)),
            orchestrator,
            greeting_delay: settings.greeting_delay,
        })
    }

    /// Greet the user and ask for the product.
    pub async fn start(&self) -> Vec<Message> {
        self.reset().await
    }

    /// Start over from the greeting, whatever the current step.
    ///
    /// Returns the greeting and, unless another reset interleaved during the
    /// pause, the first question.
    pub async fn reset(&self) -> Vec<Message> {
        let greeting = self.engine().reset();
        tokio::time::sleep(self.greeting_delay).await;
        let mut emitted = vec![greeting];
        emitted.extend(self.engine().open());
        emitted
    }

    pub fn submit_user_text(&self, text: &str) -> Vec<Message> {
        self.engine().submit_user_text(text)
    }

    /// Confirm the collected parameters and run the search to its terminal
    /// message.
    ///
    /// Rejected with [`ConversationError::SearchInProgress`] while another
    /// search from this conversation is still running.
    pub async fn confirm(&self) -> Result<SearchOutcome, ConversationError> {
        let (ticket, id) = {
            let mut engine = self.engine();
            (engine.confirm()?, engine.id())
        };

        let narrator = EngineNarrator {
            engine: &self.engine,
            ticket: &ticket,
        };
        let outcome = self
            .orchestrator
            .run_search(ticket.request().clone(), &narrator)
            .instrument(info_span!("search", conversation = %id))
            .await;

        self.engine().finish_search(&ticket, &outcome);
        Ok(outcome)
    }

    pub fn id(&self) -> Uuid {
        self.engine().id()
    }

    pub fn step(&self) -> ConversationStep {
        self.engine().step()
    }

    pub fn parameters(&self) -> SearchParameters {
        self.engine().parameters().clone()
    }

    pub fn report_reference(&self) -> Option<String> {
        self.engine().report_reference().map(str::to_string)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.engine().transcript().messages().to_vec()
    }

    pub fn is_search_in_flight(&self) -> bool {
        self.engine().is_search_in_flight()
    }

    pub fn orchestrator_settings(&self) -> &OrchestratorSettings {
        self.orchestrator.settings()
    }

    fn engine(&self) -> MutexGuard<'_, ConversationEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Routes narration into the transcript of the conversation that started the
/// search.
struct EngineNarrator<'a> {
    engine: &'a Mutex<ConversationEngine>,
    ticket: &'a SearchTicket,
}

impl Narrator for EngineNarrator<'_> {
    fn narrate(&self, text: &str) {
        self.engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .narrate(self.ticket, text);
    }
}
