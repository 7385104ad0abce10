//! In-process realtime hub.
//!
//! Per-identity topics backed by unbounded tokio channels. Repositories
//! publish row-level change events after successful writes; the transcript
//! synchronizer subscribes through the `RealtimeFeed` trait. This mirrors a
//! remote push channel closely enough to exercise every merge path,
//! including the echo of a session's own appends.

use async_trait::async_trait;
use luma_core::error::{LumaError, Result};
use luma_core::realtime::{RealtimeEvent, RealtimeFeed, RealtimeSubscription};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct Subscriber {
    token: u64,
    sender: mpsc::UnboundedSender<RealtimeEvent>,
}

#[derive(Default)]
struct HubInner {
    topics: Mutex<HashMap<String, Vec<Subscriber>>>,
    next_token: AtomicU64,
}

/// In-process realtime feed with one topic per identity.
///
/// Cheap to clone; clones share the same topic registry.
#[derive(Clone, Default)]
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

impl RealtimeHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes an event to every live subscriber of `owner_id`'s topic.
    ///
    /// Events for owners with no subscription are dropped; closed receivers
    /// are pruned in passing.
    pub fn publish(&self, owner_id: &str, event: RealtimeEvent) {
        let mut topics = self.inner.topics.lock().expect("hub topic lock poisoned");
        let Some(subscribers) = topics.get_mut(owner_id) else {
            return;
        };
        subscribers.retain(|sub| sub.sender.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            topics.remove(owner_id);
        }
    }

    /// Number of live subscriptions for `owner_id` (test/diagnostic helper).
    pub fn subscriber_count(&self, owner_id: &str) -> usize {
        let topics = self.inner.topics.lock().expect("hub topic lock poisoned");
        topics.get(owner_id).map_or(0, |subs| subs.len())
    }

    fn remove(&self, owner_id: &str, token: u64) -> bool {
        let mut topics = self.inner.topics.lock().expect("hub topic lock poisoned");
        let Some(subscribers) = topics.get_mut(owner_id) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|sub| sub.token != token);
        let removed = subscribers.len() < before;
        if subscribers.is_empty() {
            topics.remove(owner_id);
        }
        removed
    }
}

/// A live subscription handed out by [`RealtimeHub`].
pub struct HubSubscription {
    hub: RealtimeHub,
    owner_id: String,
    token: u64,
    receiver: mpsc::UnboundedReceiver<RealtimeEvent>,
    active: bool,
}

#[async_trait]
impl RealtimeSubscription for HubSubscription {
    async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.recv().await
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.hub.remove(&self.owner_id, self.token) {
            Ok(())
        } else {
            Err(LumaError::realtime(format!(
                "subscription for '{}' was already gone",
                self.owner_id
            )))
        }
    }
}

#[async_trait]
impl RealtimeFeed for RealtimeHub {
    async fn subscribe(&self, owner_id: &str) -> Result<Box<dyn RealtimeSubscription>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        {
            let mut topics = self.inner.topics.lock().expect("hub topic lock poisoned");
            topics
                .entry(owner_id.to_string())
                .or_default()
                .push(Subscriber { token, sender });
        }
        tracing::debug!("realtime subscription opened for owner '{}'", owner_id);
        Ok(Box::new(HubSubscription {
            hub: self.clone(),
            owner_id: owner_id.to_string(),
            token,
            receiver,
            active: true,
        }))
    }
}
