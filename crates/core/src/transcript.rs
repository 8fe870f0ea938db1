//! Message and Transcript domain types.
//!
//! The transcript is the sole state threaded through the dispatch loop:
//! an append-only, ordered sequence of messages. Every model invocation
//! sees the full transcript; nothing is ever edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::{ToolCall, ToolResult};

/// A single message in a transcript.
///
/// The body is a tagged union: an assistant turn either carries text or
/// tool requests, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID.
    pub id: String,

    /// When the message was appended.
    pub timestamp: DateTime<Utc>,

    /// The message payload.
    #[serde(flatten)]
    pub body: MessageBody,
}

/// The payload of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    /// Free text from the end user.
    User { content: String },

    /// A final textual answer from the assistant.
    Assistant { content: String },

    /// A set of tool invocations requested by the assistant in one turn.
    ToolRequest { calls: Vec<ToolCall> },

    /// The outcomes of one turn's tool invocations, one result per call.
    ToolResults { results: Vec<ToolResult> },
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_body(MessageBody::User {
            content: content.into(),
        })
    }

    /// Create a final assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_body(MessageBody::Assistant {
            content: content.into(),
        })
    }

    /// Create an assistant tool-request message.
    pub fn tool_request(calls: Vec<ToolCall>) -> Self {
        Self::with_body(MessageBody::ToolRequest { calls })
    }

    /// Create a tool-results message for one completed turn.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::with_body(MessageBody::ToolResults { results })
    }

    fn with_body(body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            body,
        }
    }

    /// The final answer text, if this is a plain assistant message.
    pub fn as_assistant_text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Assistant { content } => Some(content),
            _ => None,
        }
    }
}

/// An append-only ordered sequence of messages.
///
/// The message vector is private: the only mutation is [`Transcript::push`],
/// so length is monotonically increasing and ordering is never disturbed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript seeded with a single user message.
    pub fn seeded(user_message: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Message::user(user_message));
        transcript
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages, in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The text of the last assistant message, if the transcript ends with one.
    pub fn final_text(&self) -> Option<&str> {
        self.last().and_then(Message::as_assistant_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("3-day trip to Paris");
        match &msg.body {
            MessageBody::User { content } => assert_eq!(content, "3-day trip to Paris"),
            other => panic!("Expected user body, got: {other:?}"),
        }
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn seeded_transcript_has_one_message() {
        let transcript = Transcript::seeded("hello");
        assert_eq!(transcript.len(), 1);
        assert!(transcript.final_text().is_none());
    }

    #[test]
    fn final_text_requires_assistant_tail() {
        let mut transcript = Transcript::seeded("hello");
        transcript.push(Message::assistant("Here is your plan."));
        assert_eq!(transcript.final_text(), Some("Here is your plan."));

        transcript.push(Message::tool_request(vec![]));
        assert!(transcript.final_text().is_none());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::tool_request(vec![ToolCall {
            id: "call_1".into(),
            name: "get_current_weather".into(),
            arguments: serde_json::json!({"city": "Paris"}),
        }]);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        match back.body {
            MessageBody::ToolRequest { calls } => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "get_current_weather");
            }
            other => panic!("Expected tool request body, got: {other:?}"),
        }
    }

    #[test]
    fn transcript_grows_monotonically() {
        let mut transcript = Transcript::new();
        for i in 0..5 {
            transcript.push(Message::user(format!("message {i}")));
            assert_eq!(transcript.len(), i + 1);
        }
    }
}
