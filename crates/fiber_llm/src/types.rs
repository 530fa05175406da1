//! Core types for structured conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

/// A single conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID (UUID)
    pub id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// When the message was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::System,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Result of one completion exchange.
///
/// `tool_call` carries the structured payload of a tool invocation when the
/// backend produced one; most generation turns return plain text only.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub tool_call: Option<serde_json::Value>,
}

impl Completion {
    /// Completion consisting of plain text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_call: None,
        }
    }
}
