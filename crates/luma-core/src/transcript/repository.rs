//! Message repository trait.
//!
//! Defines the interface for the persisted per-identity message log.

use super::message::{Message, MessageDraft};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for the message collection.
///
/// Keyed by store-generated message id with a secondary index on
/// `owner_id + created_at`. Implementations assign ids and creation
/// timestamps on insert.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persists one or more new messages for `owner_id` in a single call.
    ///
    /// All-or-nothing: either every draft is inserted and the confirmed rows
    /// (with assigned ids) are returned, or the whole call fails. There is
    /// no partial-success contract.
    async fn insert_batch(&self, owner_id: &str, drafts: Vec<MessageDraft>)
        -> Result<Vec<Message>>;

    /// Returns every message owned by `owner_id`, ordered by creation
    /// timestamp ascending.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Message>>;

    /// Replaces the content of one message in full. Idempotent.
    async fn update_content(&self, owner_id: &str, message_id: &str, content: &str) -> Result<()>;

    /// Deletes every message owned by `owner_id`. Irreversible.
    async fn delete_by_owner(&self, owner_id: &str) -> Result<()>;
}
