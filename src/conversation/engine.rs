//! Step-driven conversation state machine.
//!
//! The engine owns the current [`ConversationStep`], the partially collected
//! [`SearchParameters`] and the [`Transcript`]. Each operation records the
//! messages it produces and returns them to the caller; nothing here waits on
//! time or I/O. Timing (greeting delay, search narration) is layered on top by
//! [`crate::session::Conversation`].

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::prompts;
use super::transcript::{Transcript, TranscriptSink};
use super::{ConversationStep, Message, SearchParameters};
use crate::errors::{ConversationError, SearchError, ValidationError};
use crate::search::{SearchOutcome, SearchRequest};

/// Input rules for parameter collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Largest result count accepted; `None` leaves it unbounded.
    pub max_result_count: Option<u32>,
    /// Stores to restrict the search to, sent along with every request.
    pub websites: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_result_count: Some(50),
            websites: Vec::new(),
        }
    }
}

/// Proof that a search was started, tying its narration and outcome back to
/// the conversation that started it.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    epoch: u64,
    request: SearchRequest,
}

impl SearchTicket {
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }
}

#[derive(Debug)]
pub struct ConversationEngine {
    id: Uuid,
    step: ConversationStep,
    parameters: SearchParameters,
    transcript: Transcript,
    report_reference: Option<String>,
    settings: EngineSettings,
    /// Bumped on every reset so results of earlier searches can be told apart.
    epoch: u64,
    search_in_flight: bool,
}

impl ConversationEngine {
    /// Create an engine in the `greeting` step with an empty transcript.
    ///
    /// Call [`Self::reset`] and [`Self::open`] to emit the greeting sequence.
    pub fn new(settings: EngineSettings, sink: Arc<dyn TranscriptSink>) -> Self {
        Self {
            id: Uuid::new_v4(),
            step: ConversationStep::Greeting,
            parameters: SearchParameters::default(),
            transcript: Transcript::new(sink),
            report_reference: None,
            settings,
            epoch: 0,
            search_in_flight: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> ConversationStep {
        self.step
    }

    pub fn parameters(&self) -> &SearchParameters {
        &self.parameters
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Where the last successful search put its report.
    pub fn report_reference(&self) -> Option<&str> {
        self.report_reference.as_deref()
    }

    pub fn is_search_in_flight(&self) -> bool {
        self.search_in_flight
    }

    /// Start over: clear the transcript, parameters and report together, return
    /// to `greeting` and emit the greeting.
    ///
    /// A search that is still running keeps the in-flight flag set; its
    /// narration and outcome are discarded when they arrive.
    pub fn reset(&mut self) -> Message {
        self.transcript.clear();
        self.parameters = SearchParameters::default();
        self.report_reference = None;
        self.epoch += 1;
        self.id = Uuid::new_v4();
        self.advance(ConversationStep::Greeting);
        self.say(prompts::GREETING)
    }

    /// Ask the first question, moving `greeting` to `awaiting_product`.
    ///
    /// Returns `None` when the conversation is past the greeting.
    pub fn open(&mut self) -> Option<Message> {
        if self.step != ConversationStep::Greeting {
            return None;
        }
        self.advance(ConversationStep::AwaitingProduct);
        Some(self.say(prompts::ASK_PRODUCT))
    }

    /// Interpret one user answer according to the current step.
    ///
    /// Blank input, and any input outside the three collection steps, is
    /// ignored: nothing is recorded and an empty list is returned. Otherwise
    /// the user's message comes first in the returned list, followed by the
    /// assistant's reply.
    pub fn submit_user_text(&mut self, text: &str) -> Vec<Message> {
        let text = text.trim();
        if text.is_empty() || !self.step.accepts_text() {
            return Vec::new();
        }

        let mut emitted = vec![self.transcript.push(Message::user(text))];
        match self.step {
            ConversationStep::AwaitingProduct => {
                self.parameters.product_name = Some(text.to_string());
                self.advance(ConversationStep::AwaitingCountry);
                emitted.push(self.say(prompts::ASK_COUNTRY));
            }
            ConversationStep::AwaitingCountry => {
                self.parameters.country = Some(text.to_string());
                self.advance(ConversationStep::AwaitingCount);
                emitted.push(self.say(prompts::ASK_COUNT));
            }
            ConversationStep::AwaitingCount => match self.parse_count(text) {
                Ok(count) => {
                    self.parameters.result_count = Some(count);
                    self.advance(ConversationStep::AwaitingConfirmation);
                    let summary = prompts::summary(
                        self.parameters.product_name.as_deref().unwrap_or_default(),
                        self.parameters.country.as_deref().unwrap_or_default(),
                        count,
                    );
                    emitted.push(self.say(&summary));
                }
                Err(rejection) => {
                    debug!(conversation = %self.id, input = text, %rejection, "Rejected result count");
                    emitted.push(self.say(&rejection.to_string()));
                }
            },
            _ => {}
        }
        emitted
    }

    /// Accept the summarized parameters and move to `searching`.
    ///
    /// Only valid in `awaiting_confirmation` while no other search is running.
    /// The returned ticket carries a copy of the parameters for the
    /// orchestrator.
    pub fn confirm(&mut self) -> Result<SearchTicket, ConversationError> {
        if self.search_in_flight {
            return Err(ConversationError::SearchInProgress);
        }
        if self.step != ConversationStep::AwaitingConfirmation {
            return Err(ConversationError::UnexpectedStep {
                action: "confirm",
                step: self.step,
            });
        }

        let request = self.parameters.to_request(&self.settings.websites)?;
        self.search_in_flight = true;
        self.advance(ConversationStep::Searching);
        Ok(SearchTicket {
            epoch: self.epoch,
            request,
        })
    }

    /// Record a narration line for the search identified by `ticket`.
    ///
    /// Dropped when the conversation has been reset since the search started.
    pub fn narrate(&mut self, ticket: &SearchTicket, text: &str) -> Option<Message> {
        if !self.is_current(ticket) {
            return None;
        }
        Some(self.say(text))
    }

    /// Conclude the search identified by `ticket` with its single terminal
    /// message.
    ///
    /// Success moves to `done` and exposes the report reference. Any failure
    /// clears the parameters and goes back to `awaiting_product` so the user
    /// can start collecting again. An outcome for a conversation that has been
    /// reset since only releases the in-flight flag.
    pub fn finish_search(
        &mut self,
        ticket: &SearchTicket,
        outcome: &SearchOutcome,
    ) -> Option<Message> {
        self.search_in_flight = false;
        if !self.is_current(ticket) {
            debug!(conversation = %self.id, "Discarding outcome of a search from before the last reset");
            return None;
        }

        let text = match outcome {
            SearchOutcome::Success { report_reference } => {
                self.report_reference = Some(report_reference.clone());
                self.advance(ConversationStep::Done);
                prompts::REPORT_READY.to_string()
            }
            SearchOutcome::Failure { error } => {
                self.parameters = SearchParameters::default();
                self.advance(ConversationStep::AwaitingProduct);
                match error {
                    SearchError::Application { message } => prompts::service_error(message),
                    SearchError::Transport(_) | SearchError::TimedOut { .. } => {
                        prompts::SEARCH_FAILED.to_string()
                    }
                }
            }
        };
        Some(self.say(&text))
    }

    fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.epoch == self.epoch && self.step == ConversationStep::Searching
    }

    fn parse_count(&self, text: &str) -> Result<u32, ValidationError> {
        let value: i64 = text.parse().map_err(|_| ValidationError::NotANumber)?;
        if value < 1 {
            return Err(ValidationError::NotPositive);
        }
        let max = self.settings.max_result_count.unwrap_or(u32::MAX);
        match u32::try_from(value) {
            Ok(count) if count <= max => Ok(count),
            _ => Err(ValidationError::TooLarge { max }),
        }
    }

    fn advance(&mut self, next: ConversationStep) {
        debug!(conversation = %self.id, from = %self.step, to = %next, "Step transition");
        self.step = next;
    }

    fn say(&mut self, text: &str) -> Message {
        self.transcript.push(Message::bot(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::NullTranscriptSink;

    fn engine() -> ConversationEngine {
        let mut engine = ConversationEngine::new(EngineSettings::default(), Arc::new(NullTranscriptSink));
        engine.reset();
        engine.open();
        engine
    }

    fn engine_at_confirmation() -> ConversationEngine {
        let mut engine = engine();
        engine.submit_user_text("Laptop");
        engine.submit_user_text("Germany");
        engine.submit_user_text("10");
        engine
    }

    fn bot_texts(messages: &[Message]) -> Vec<&str> {
        messages
            .iter()
            .filter(|m| m.is_bot())
            .map(|m| m.text.as_str())
            .collect()
    }

    // =========================================
    // greeting / reset
    // =========================================

    #[test]
    fn test_new_engine_starts_silent_in_greeting() {
        let engine = ConversationEngine::new(EngineSettings::default(), Arc::new(NullTranscriptSink));
        assert_eq!(engine.step(), ConversationStep::Greeting);
        assert!(engine.transcript().is_empty());
    }

    #[test]
    fn test_reset_then_open_emits_greeting_sequence() {
        let engine = engine();
        assert_eq!(engine.step(), ConversationStep::AwaitingProduct);
        let texts = bot_texts(engine.transcript().messages());
        assert_eq!(texts, vec![prompts::GREETING, prompts::ASK_PRODUCT]);
    }

    #[test]
    fn test_open_is_noop_after_greeting() {
        let mut engine = engine();
        assert!(engine.open().is_none());
        assert_eq!(engine.transcript().len(), 2);
    }

    #[test]
    fn test_reset_from_confirmation_clears_everything() {
        let mut engine = engine_at_confirmation();
        assert!(engine.parameters().is_complete());

        let greeting = engine.reset();

        assert_eq!(greeting.text, prompts::GREETING);
        assert_eq!(engine.step(), ConversationStep::Greeting);
        assert_eq!(engine.parameters(), &SearchParameters::default());
        assert_eq!(engine.transcript().len(), 1);
    }

    #[test]
    fn test_reset_changes_conversation_id() {
        let mut engine = engine();
        let before = engine.id();
        engine.reset();
        assert_ne!(engine.id(), before);
    }

    // =========================================
    // submit_user_text
    // =========================================

    #[test]
    fn test_product_answer_is_stored_and_advances() {
        let mut engine = engine();
        let emitted = engine.submit_user_text("Noise cancelling headphones");

        assert_eq!(
            engine.parameters().product_name.as_deref(),
            Some("Noise cancelling headphones")
        );
        assert_eq!(engine.step(), ConversationStep::AwaitingCountry);
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].text, "Noise cancelling headphones");
        assert!(!emitted[0].is_bot());
        assert_eq!(emitted[1].text, prompts::ASK_COUNTRY);
    }

    #[test]
    fn test_country_answer_is_stored_and_advances() {
        let mut engine = engine();
        engine.submit_user_text("Laptop");
        let emitted = engine.submit_user_text("United Arab Emirates");

        assert_eq!(
            engine.parameters().country.as_deref(),
            Some("United Arab Emirates")
        );
        assert_eq!(engine.step(), ConversationStep::AwaitingCount);
        assert_eq!(bot_texts(&emitted), vec![prompts::ASK_COUNT]);
    }

    #[test]
    fn test_answers_are_trimmed() {
        let mut engine = engine();
        engine.submit_user_text("  Laptop \n");
        assert_eq!(engine.parameters().product_name.as_deref(), Some("Laptop"));
    }

    #[test]
    fn test_non_numeric_count_is_rejected_in_place() {
        let mut engine = engine();
        engine.submit_user_text("Laptop");
        engine.submit_user_text("Germany");

        let emitted = engine.submit_user_text("abc");

        assert_eq!(engine.step(), ConversationStep::AwaitingCount);
        assert_eq!(engine.parameters().result_count, None);
        assert_eq!(bot_texts(&emitted), vec!["Please enter a valid number."]);
    }

    #[test]
    fn test_zero_and_negative_counts_are_rejected() {
        let mut engine = engine();
        engine.submit_user_text("Laptop");
        engine.submit_user_text("Germany");

        for input in ["0", "-3"] {
            let emitted = engine.submit_user_text(input);
            assert_eq!(
                bot_texts(&emitted),
                vec!["Please enter a number greater than zero."]
            );
        }
        assert_eq!(engine.step(), ConversationStep::AwaitingCount);
        assert_eq!(engine.parameters().result_count, None);
    }

    #[test]
    fn test_count_above_bound_is_rejected() {
        let mut engine = engine();
        engine.submit_user_text("Laptop");
        engine.submit_user_text("Germany");

        let emitted = engine.submit_user_text("51");

        assert_eq!(
            bot_texts(&emitted),
            vec!["Please enter a number no larger than 50."]
        );
        assert_eq!(engine.parameters().result_count, None);
    }

    #[test]
    fn test_unbounded_count_accepts_large_values() {
        let settings = EngineSettings {
            max_result_count: None,
            websites: Vec::new(),
        };
        let mut engine = ConversationEngine::new(settings, Arc::new(NullTranscriptSink));
        engine.reset();
        engine.open();
        engine.submit_user_text("Laptop");
        engine.submit_user_text("Germany");
        engine.submit_user_text("5000");
        assert_eq!(engine.parameters().result_count, Some(5000));
    }

    #[test]
    fn test_valid_count_emits_summary() {
        let mut engine = engine();
        engine.submit_user_text("Laptop");
        engine.submit_user_text("Germany");

        let emitted = engine.submit_user_text("5");

        assert_eq!(engine.parameters().result_count, Some(5));
        assert_eq!(engine.step(), ConversationStep::AwaitingConfirmation);
        assert_eq!(
            bot_texts(&emitted),
            vec![prompts::summary("Laptop", "Germany", 5).as_str()]
        );
    }

    #[test]
    fn test_blank_input_is_noop_while_collecting() {
        let mut engine = engine();
        for _ in 0..3 {
            let before_step = engine.step();
            let before_len = engine.transcript().len();
            let before_params = engine.parameters().clone();

            assert!(engine.submit_user_text("").is_empty());
            assert!(engine.submit_user_text("   \t ").is_empty());

            assert_eq!(engine.step(), before_step);
            assert_eq!(engine.transcript().len(), before_len);
            assert_eq!(engine.parameters(), &before_params);

            engine.submit_user_text("7");
        }
    }

    #[test]
    fn test_text_outside_collection_steps_is_ignored() {
        let mut engine = engine_at_confirmation();
        let len = engine.transcript().len();

        assert!(engine.submit_user_text("Phone").is_empty());

        assert_eq!(engine.step(), ConversationStep::AwaitingConfirmation);
        assert_eq!(engine.transcript().len(), len);
        assert_eq!(engine.parameters().product_name.as_deref(), Some("Laptop"));
    }

    // =========================================
    // confirm / narrate / finish_search
    // =========================================

    #[test]
    fn test_confirm_outside_confirmation_step_is_an_error() {
        let mut engine = engine();
        let err = engine.confirm().unwrap_err();
        assert_eq!(
            err,
            ConversationError::UnexpectedStep {
                action: "confirm",
                step: ConversationStep::AwaitingProduct,
            }
        );
    }

    #[test]
    fn test_confirm_hands_out_a_copy_of_the_parameters() {
        let mut engine = engine_at_confirmation();
        let ticket = engine.confirm().unwrap();

        assert_eq!(engine.step(), ConversationStep::Searching);
        assert!(engine.is_search_in_flight());
        assert_eq!(ticket.request().product_name, "Laptop");
        assert_eq!(ticket.request().country, "Germany");
        assert_eq!(ticket.request().result_count, 10);
    }

    #[test]
    fn test_second_confirm_is_rejected_while_searching() {
        let mut engine = engine_at_confirmation();
        engine.confirm().unwrap();
        assert_eq!(
            engine.confirm().unwrap_err(),
            ConversationError::SearchInProgress
        );
    }

    #[test]
    fn test_success_moves_to_done_and_exposes_report() {
        let mut engine = engine_at_confirmation();
        let ticket = engine.confirm().unwrap();

        let terminal = engine
            .finish_search(
                &ticket,
                &SearchOutcome::Success {
                    report_reference: "R1".into(),
                },
            )
            .unwrap();

        assert_eq!(terminal.text, prompts::REPORT_READY);
        assert_eq!(engine.step(), ConversationStep::Done);
        assert_eq!(engine.report_reference(), Some("R1"));
        assert!(!engine.is_search_in_flight());
    }

    #[test]
    fn test_application_error_returns_to_product_step() {
        let mut engine = engine_at_confirmation();
        let ticket = engine.confirm().unwrap();

        let terminal = engine
            .finish_search(
                &ticket,
                &SearchOutcome::Failure {
                    error: SearchError::Application {
                        message: "No results found".into(),
                    },
                },
            )
            .unwrap();

        assert!(terminal.text.contains("No results found"));
        assert_eq!(engine.step(), ConversationStep::AwaitingProduct);
        assert_eq!(engine.parameters(), &SearchParameters::default());
        assert_eq!(engine.report_reference(), None);
    }

    #[test]
    fn test_transport_error_uses_generic_message() {
        let mut engine = engine_at_confirmation();
        let ticket = engine.confirm().unwrap();

        let terminal = engine
            .finish_search(
                &ticket,
                &SearchOutcome::Failure {
                    error: SearchError::Transport("connection refused".into()),
                },
            )
            .unwrap();

        assert_eq!(terminal.text, prompts::SEARCH_FAILED);
        assert!(!terminal.text.contains("connection refused"));
        assert_eq!(engine.step(), ConversationStep::AwaitingProduct);
    }

    #[test]
    fn test_narration_is_recorded_while_searching() {
        let mut engine = engine_at_confirmation();
        let ticket = engine.confirm().unwrap();
        let before = engine.transcript().len();

        let narrated = engine.narrate(&ticket, "Searching in online stores...");

        assert!(narrated.is_some());
        assert_eq!(engine.transcript().len(), before + 1);
    }

    #[test]
    fn test_reset_during_search_discards_narration_and_outcome() {
        let mut engine = engine_at_confirmation();
        let ticket = engine.confirm().unwrap();

        engine.reset();
        engine.open();

        assert!(engine.narrate(&ticket, "late narration").is_none());
        assert!(engine.is_search_in_flight());

        let terminal = engine.finish_search(
            &ticket,
            &SearchOutcome::Success {
                report_reference: "R1".into(),
            },
        );

        assert!(terminal.is_none());
        assert!(!engine.is_search_in_flight());
        assert_eq!(engine.step(), ConversationStep::AwaitingProduct);
        assert_eq!(engine.report_reference(), None);
        assert_eq!(engine.transcript().len(), 2);
    }

    #[test]
    fn test_confirm_after_reset_waits_for_the_old_search() {
        let mut engine = engine_at_confirmation();
        let ticket = engine.confirm().unwrap();

        engine.reset();
        engine.open();
        engine.submit_user_text("Phone");
        engine.submit_user_text("France");
        engine.submit_user_text("3");

        assert_eq!(
            engine.confirm().unwrap_err(),
            ConversationError::SearchInProgress
        );

        engine.finish_search(
            &ticket,
            &SearchOutcome::Failure {
                error: SearchError::Transport("late".into()),
            },
        );
        assert!(engine.confirm().is_ok());
    }
}
