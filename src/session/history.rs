//! Append-only conversation history

use crate::response::CanonicalResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub is_from_user: bool,
    pub created_at: DateTime<Utc>,
    /// Present only on assistant messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CanonicalResponse>,
    pub segments: Vec<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            text: text.into(),
            is_from_user: true,
            created_at: Utc::now(),
            response: None,
            segments: vec![],
        }
    }

    pub fn assistant(response: CanonicalResponse) -> Self {
        Self {
            id: new_message_id(),
            text: response.text.clone(),
            is_from_user: false,
            created_at: Utc::now(),
            segments: response.segments.clone(),
            response: Some(response),
        }
    }
}

fn new_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}

/// Messages of the current session, oldest first
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_reply(&self) -> Option<&CanonicalResponse> {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.response.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_message_carries_segments() {
        let message = Message::assistant(CanonicalResponse::text("one | two"));
        assert!(!message.is_from_user);
        assert_eq!(message.text, "one | two");
        assert_eq!(message.segments, vec!["one", "two"]);
        assert!(message.response.is_some());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("msg_"));
    }

    #[test]
    fn test_user_message_serializes_without_response() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["isFromUser"], true);
        assert!(json.get("response").is_none());
    }

    #[test]
    fn test_last_reply_skips_user_messages() {
        let mut history = History::default();
        assert!(history.last_reply().is_none());
        history.push(Message::assistant(CanonicalResponse::text("first")));
        history.push(Message::user("question"));
        assert_eq!(history.last_reply().unwrap().text, "first");
        assert_eq!(history.len(), 2);
        history.clear();
        assert!(history.is_empty());
    }
}
