//! Append-only conversation transcript.
//!
//! The transcript keeps every message in order and forwards each one to a
//! [`TranscriptSink`], the rendering side of the conversation. Messages are
//! never edited or removed individually; the only way to drop them is a full
//! reset of the conversation.

use std::sync::Arc;

use super::Message;

/// Receives transcript updates for presentation.
pub trait TranscriptSink: Send + Sync {
    /// Called once per message, in transcript order.
    fn append(&self, message: &Message);

    /// Called when the conversation is reset and the transcript emptied.
    fn cleared(&self) {}
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTranscriptSink;

impl TranscriptSink for NullTranscriptSink {
    fn append(&self, _message: &Message) {}
}

pub struct Transcript {
    messages: Vec<Message>,
    sink: Arc<dyn TranscriptSink>,
}

impl Transcript {
    pub fn new(sink: Arc<dyn TranscriptSink>) -> Self {
        Self {
            messages: Vec::new(),
            sink,
        }
    }

    /// Append a message and hand a copy back to the caller.
    pub fn push(&mut self, message: Message) -> Message {
        self.sink.append(&message);
        self.messages.push(message.clone());
        message
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
        self.sink.cleared();
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}
