//! Realtime feed abstraction.
//!
//! The feed is a per-identity push channel delivering row-level change
//! notifications for the message collection as they occur, independent of
//! polling.

use crate::error::Result;
use crate::transcript::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A row-level change delivered by the realtime feed.
///
/// Each event carries the full message row. Delivery order follows arrival,
/// not creation timestamps, and duplicates are possible; consumers are
/// responsible for dedup and positioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// A new row was inserted.
    Insert(Message),
    /// An existing row's content changed (streaming update).
    Update(Message),
}

impl RealtimeEvent {
    /// The message row carried by this event.
    pub fn message(&self) -> &Message {
        match self {
            Self::Insert(m) | Self::Update(m) => m,
        }
    }
}

/// A live subscription to one identity's message topic.
///
/// The subscription ends when `recv` returns `None` (channel closed) or
/// after `unsubscribe`. Failing to unsubscribe is not fatal but must be
/// logged by the caller.
#[async_trait]
pub trait RealtimeSubscription: Send {
    /// Receives the next event, or `None` once the channel has closed.
    async fn recv(&mut self) -> Option<RealtimeEvent>;

    /// Tears the subscription down on the feed side.
    async fn unsubscribe(&mut self) -> Result<()>;
}

/// The realtime push feed, one topic per identity.
#[async_trait]
pub trait RealtimeFeed: Send + Sync {
    /// Opens a subscription to `owner_id`'s message topic.
    async fn subscribe(&self, owner_id: &str) -> Result<Box<dyn RealtimeSubscription>>;
}
