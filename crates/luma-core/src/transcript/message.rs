//! Chat message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the locally synthesized greeting shown for empty transcripts.
///
/// The placeholder is never persisted; the store will never hand out this id.
pub const PLACEHOLDER_MESSAGE_ID: &str = "placeholder";

/// Represents the role of a message in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
}

/// A single persisted chat turn.
///
/// The id is assigned by the store on creation and stable thereafter.
/// Content is the only mutable attribute; it is replaced in full during
/// token-by-token streaming of generated replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned identifier
    pub id: String,
    /// The role of the message sender
    pub role: MessageRole,
    /// The content of the message
    pub content: String,
    /// Creation timestamp, the transcript ordering key
    pub created_at: DateTime<Utc>,
    /// Identity that owns this message
    pub owner_id: String,
}

impl Message {
    /// Builds the non-persisted placeholder synthesized for empty transcripts.
    pub fn placeholder(owner_id: &str, content: &str) -> Self {
        Self {
            id: PLACEHOLDER_MESSAGE_ID.to_string(),
            role: MessageRole::Assistant,
            content: content.to_string(),
            created_at: Utc::now(),
            owner_id: owner_id.to_string(),
        }
    }
}

/// A new message before the store has assigned its id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub role: MessageRole,
    pub content: String,
}

impl MessageDraft {
    /// Creates a user-authored draft.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant-authored draft.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
