//! Conversation transcript model.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        MessageRole::parse(input).ok_or(())
    }
}

/// A single transcript entry. `annotations` carries structured payloads that
/// ride along with the text (routing decisions, offered suggestions, selected
/// tokens) without being part of the user-visible content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub annotations: serde_json::Map<String, serde_json::Value>,
    pub created_at_ms: Option<u64>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            annotations: serde_json::Map::new(),
            created_at_ms: Some(chrono::Utc::now().timestamp_millis() as u64),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&serde_json::Value> {
        self.annotations.get(key)
    }
}
