//! End-to-end conversation scenarios against a scripted search client.
//!
//! Time is paused, so the presentation window and narration offsets elapse
//! instantly while keeping their order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use procure::conversation::{ConversationStep, Message, Sender, TranscriptSink, prompts};
use procure::errors::{ConversationError, SearchError};
use procure::search::{
    NullProgressSink, ResponseStatus, SearchClient, SearchRequest, SearchResponse,
};
use procure::session::{Conversation, ConversationSettings};

struct ScriptedClient {
    delay: Duration,
    result: Result<SearchResponse, SearchError>,
    requests: Mutex<Vec<SearchRequest>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(delay: Duration, result: Result<SearchResponse, SearchError>) -> Arc<Self> {
        Arc::new(Self {
            delay,
            result,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn success(reference: &str) -> Arc<Self> {
        Self::new(
            Duration::from_millis(500),
            Ok(SearchResponse {
                status: ResponseStatus::Success,
                message: Some("Report generated successfully".into()),
                report_url: Some(reference.into()),
            }),
        )
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchClient for ScriptedClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<Message>>,
    clears: AtomicUsize,
}

impl RecordingSink {
    fn bot_texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.sender == Sender::Bot)
            .map(|m| m.text.clone())
            .collect()
    }
}

impl TranscriptSink for RecordingSink {
    fn append(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.clone());
    }

    fn cleared(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

fn conversation(client: Arc<ScriptedClient>, sink: Arc<RecordingSink>) -> Conversation {
    Conversation::new(
        ConversationSettings::default(),
        client,
        sink,
        Arc::new(NullProgressSink),
    )
    .unwrap()
}

async fn collect_parameters(conv: &Conversation) {
    conv.start().await;
    conv.submit_user_text("Laptop");
    conv.submit_user_text("Germany");
    conv.submit_user_text("10");
    assert_eq!(conv.step(), ConversationStep::AwaitingConfirmation);
}

fn narration_texts() -> Vec<String> {
    prompts::NARRATION
        .iter()
        .map(|(_, text)| text.to_string())
        .collect()
}

/// Bot messages after the summary: narration followed by the terminal message.
fn search_messages(conv: &Conversation) -> Vec<String> {
    let bot: Vec<String> = conv
        .messages()
        .into_iter()
        .filter(Message::is_bot)
        .map(|m| m.text)
        .collect();
    let summary = bot
        .iter()
        .position(|t| t.starts_with("I will search for"))
        .expect("summary message present");
    bot[summary + 1..].to_vec()
}

// =============================================================================
// Parameter collection
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_parameters_are_stored_verbatim_and_summarized() {
    let client = ScriptedClient::success("R1");
    let conv = conversation(client, Arc::new(RecordingSink::default()));

    conv.start().await;
    conv.submit_user_text("  Gaming Laptop 15\"  ");
    conv.submit_user_text("Egypt");
    conv.submit_user_text("abc");
    assert_eq!(conv.step(), ConversationStep::AwaitingCount);
    conv.submit_user_text("5");

    let params = conv.parameters();
    assert_eq!(params.product_name.as_deref(), Some("Gaming Laptop 15\""));
    assert_eq!(params.country.as_deref(), Some("Egypt"));
    assert_eq!(params.result_count, Some(5));
    let last = conv.messages().last().cloned().unwrap();
    assert!(last.text.contains("Gaming Laptop 15\""));
    assert!(last.text.contains("Egypt"));
    assert!(last.text.contains('5'));
}

// =============================================================================
// Scenario A: success
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_scenario_success_exposes_report() {
    let client = ScriptedClient::success("R1");
    let sink = Arc::new(RecordingSink::default());
    let conv = conversation(client.clone(), sink.clone());
    collect_parameters(&conv).await;

    let outcome = conv.confirm().await.unwrap();

    assert!(outcome.is_success());
    let mut expected = narration_texts();
    expected.push(prompts::REPORT_READY.to_string());
    assert_eq!(search_messages(&conv), expected);
    assert_eq!(conv.report_reference().as_deref(), Some("R1"));
    assert_eq!(conv.step(), ConversationStep::Done);
    assert_eq!(client.calls(), 1);

    let request = client.requests.lock().unwrap()[0].clone();
    assert_eq!(request.product_name, "Laptop");
    assert_eq!(request.country, "Germany");
    assert_eq!(request.result_count, 10);

    // The sink saw the same bot messages in the same order.
    let transcript_bot: Vec<String> = conv
        .messages()
        .into_iter()
        .filter(Message::is_bot)
        .map(|m| m.text)
        .collect();
    assert_eq!(sink.bot_texts(), transcript_bot);
}

// =============================================================================
// Scenario B: application error
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_scenario_application_error_surfaces_message() {
    let client = ScriptedClient::new(
        Duration::from_millis(200),
        Ok(SearchResponse {
            status: ResponseStatus::Error,
            message: Some("No results found".into()),
            report_url: None,
        }),
    );
    let conv = conversation(client, Arc::new(RecordingSink::default()));
    collect_parameters(&conv).await;

    let outcome = conv.confirm().await.unwrap();

    assert!(!outcome.is_success());
    let messages = search_messages(&conv);
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[..4], narration_texts()[..]);
    assert!(messages[4].contains("No results found"));
    assert_eq!(conv.report_reference(), None);
    assert_eq!(conv.step(), ConversationStep::AwaitingProduct);
    assert_eq!(conv.parameters(), Default::default());
}

// =============================================================================
// Scenario C: transport failure
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_scenario_transport_failure_uses_generic_message() {
    let client = ScriptedClient::new(
        Duration::ZERO,
        Err(SearchError::Transport("connection refused".into())),
    );
    let conv = conversation(client, Arc::new(RecordingSink::default()));
    collect_parameters(&conv).await;

    conv.confirm().await.unwrap();

    let messages = search_messages(&conv);
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[4], prompts::SEARCH_FAILED);
    assert!(!messages[4].contains("No results found"));
    assert_eq!(conv.step(), ConversationStep::AwaitingProduct);

    // The user can go straight into another round.
    conv.submit_user_text("Phone");
    assert_eq!(conv.step(), ConversationStep::AwaitingCountry);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_service_times_out_with_generic_message() {
    let client = ScriptedClient::success("R1");
    let slow = ScriptedClient::new(Duration::from_secs(3_600), client.result.clone());
    let mut settings = ConversationSettings::default();
    settings.orchestrator.max_wait = Duration::from_secs(20);
    let conv = Conversation::new(
        settings,
        slow,
        Arc::new(RecordingSink::default()),
        Arc::new(NullProgressSink),
    )
    .unwrap();
    collect_parameters(&conv).await;

    let outcome = conv.confirm().await.unwrap();

    assert_eq!(
        outcome.error(),
        Some(&SearchError::TimedOut {
            waited: Duration::from_secs(20)
        })
    );
    assert_eq!(search_messages(&conv).last().unwrap(), prompts::SEARCH_FAILED);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_double_confirm_issues_one_remote_call() {
    let client = ScriptedClient::success("R1");
    let conv = conversation(client.clone(), Arc::new(RecordingSink::default()));
    collect_parameters(&conv).await;

    let (first, second) = tokio::join!(conv.confirm(), conv.confirm());

    assert!(first.unwrap().is_success());
    assert_eq!(second.unwrap_err(), ConversationError::SearchInProgress);
    assert_eq!(client.calls(), 1);
    let terminal_count = conv
        .messages()
        .iter()
        .filter(|m| m.text == prompts::REPORT_READY)
        .count();
    assert_eq!(terminal_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_search_discards_its_narration_and_outcome() {
    let client = ScriptedClient::success("R1");
    let sink = Arc::new(RecordingSink::default());
    let conv = conversation(client.clone(), sink.clone());
    collect_parameters(&conv).await;

    let (outcome, _) = tokio::join!(conv.confirm(), async {
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        conv.reset().await
    });

    assert!(outcome.unwrap().is_success());
    let texts: Vec<String> = conv.messages().into_iter().map(|m| m.text).collect();
    assert_eq!(
        texts,
        vec![prompts::GREETING.to_string(), prompts::ASK_PRODUCT.to_string()]
    );
    assert_eq!(conv.step(), ConversationStep::AwaitingProduct);
    assert_eq!(conv.report_reference(), None);
    assert!(!conv.is_search_in_flight());
    assert_eq!(client.calls(), 1);
    // start + reset
    assert_eq!(sink.clears.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reset_yields_fresh_greeting_sequence() {
    let client = ScriptedClient::success("R1");
    let conv = conversation(client, Arc::new(RecordingSink::default()));
    collect_parameters(&conv).await;
    let first_id = conv.id();

    let emitted = conv.reset().await;

    assert_eq!(emitted.len(), 2);
    assert_eq!(conv.messages(), emitted);
    assert_eq!(conv.step(), ConversationStep::AwaitingProduct);
    assert_eq!(conv.parameters(), Default::default());
    assert_ne!(conv.id(), first_id);
}
