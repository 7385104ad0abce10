//! Transcript synchronization.
//!
//! Maintains the local mirror of one identity's message log: initial load,
//! ordered merge of realtime events, optimistic append echo-dedup, streaming
//! content replacement, and reconnect with full resync. The mirror is always
//! renderable; every failure degrades to a logged warning rather than a
//! crash.

use luma_core::config::RealtimeSettings;
use luma_core::error::Result;
use luma_core::realtime::{RealtimeEvent, RealtimeFeed, RealtimeSubscription};
use luma_core::session::SessionHandle;
use luma_core::transcript::{Message, MessageDraft, MessageRepository, PLACEHOLDER_MESSAGE_ID};
use luma_core::LumaError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle of the transcript mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No identity bound, mirror empty.
    Unbound,
    /// Initial load in flight.
    Loading,
    /// Mirror live; realtime events are being merged.
    Live,
}

/// Mirrors the persisted message log for the bound identity.
pub struct TranscriptSynchronizer {
    session: SessionHandle,
    repo: Arc<dyn MessageRepository>,
    feed: Arc<dyn RealtimeFeed>,
    settings: RealtimeSettings,
    placeholder_text: String,
    messages: Arc<RwLock<Vec<Message>>>,
    state: Arc<RwLock<SyncState>>,
    pump: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl TranscriptSynchronizer {
    /// Creates a synchronizer over the shared session, message store, and
    /// realtime feed.
    pub fn new(
        session: SessionHandle,
        repo: Arc<dyn MessageRepository>,
        feed: Arc<dyn RealtimeFeed>,
        settings: RealtimeSettings,
        placeholder_text: impl Into<String>,
    ) -> Self {
        Self {
            session,
            repo,
            feed,
            settings,
            placeholder_text: placeholder_text.into(),
            messages: Arc::new(RwLock::new(Vec::new())),
            state: Arc::new(RwLock::new(SyncState::Unbound)),
            pump: Mutex::new(None),
        }
    }

    /// Current mirror contents, ordered by creation timestamp.
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SyncState {
        *self.state.read().await
    }

    /// Loads the transcript and starts the realtime pump.
    ///
    /// A failed initial load is logged and treated as an empty transcript;
    /// a failed subscribe leaves the mirror live but degraded (the pump will
    /// keep trying to connect). Neither is fatal.
    pub async fn start(&self) -> Result<()> {
        let snapshot = self
            .session
            .snapshot()
            .await
            .ok_or(LumaError::IdentityUnavailable)?;
        let epoch = snapshot.epoch;
        let owner_id = snapshot.user_id;

        self.stop_pump().await;
        *self.state.write().await = SyncState::Loading;

        let loaded = match self.repo.list_by_owner(&owner_id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("transcript load failed, starting empty: {}", e);
                Vec::new()
            }
        };
        let initial = if loaded.is_empty() {
            vec![Message::placeholder(&owner_id, &self.placeholder_text)]
        } else {
            loaded
        };
        *self.messages.write().await = initial;

        let subscription = match self.feed.subscribe(&owner_id).await {
            Ok(sub) => Some(sub),
            Err(e) => {
                tracing::warn!("realtime subscribe failed, will retry: {}", e);
                None
            }
        };

        let token = CancellationToken::new();
        let pump = Pump {
            session: self.session.clone(),
            repo: self.repo.clone(),
            feed: self.feed.clone(),
            settings: self.settings.clone(),
            messages: self.messages.clone(),
            owner_id,
            epoch,
            token: token.clone(),
        };
        let handle = tokio::spawn(pump.run(subscription));
        *self.pump.lock().await = Some((token, handle));

        *self.state.write().await = SyncState::Live;
        Ok(())
    }

    /// Persists `drafts` and merges the confirmed rows into the mirror.
    ///
    /// Returns the confirmed rows, or an empty `Vec` if no identity is bound
    /// or the insert failed (logged, nothing applied locally). The realtime
    /// echo of these rows arrives later and is absorbed by id-dedup.
    pub async fn append(&self, drafts: Vec<MessageDraft>) -> Vec<Message> {
        let Some(snapshot) = self.session.snapshot().await else {
            tracing::warn!("append dropped: no bound session");
            return Vec::new();
        };
        let epoch = snapshot.epoch;

        match self.repo.insert_batch(&snapshot.user_id, drafts).await {
            Ok(rows) => {
                if self.session.current_epoch() == epoch {
                    let mut mirror = self.messages.write().await;
                    mirror.retain(|m| m.id != PLACEHOLDER_MESSAGE_ID);
                    for row in &rows {
                        insert_ordered(&mut mirror, row.clone());
                    }
                } else {
                    tracing::debug!("append confirmed after identity change, not mirrored");
                }
                rows
            }
            Err(e) => {
                tracing::warn!("append failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Replaces one message's content in the mirror and, for persisted rows,
    /// in the store. Used for token-by-token streaming of generated replies.
    ///
    /// The store write is fire-and-forget at the API level: a failure is
    /// logged and the local replacement stands (the next full resync
    /// reconciles).
    pub async fn replace_content(&self, message_id: &str, content: &str) {
        {
            let mut mirror = self.messages.write().await;
            match mirror.iter_mut().find(|m| m.id == message_id) {
                Some(message) => message.content = content.to_string(),
                None => {
                    tracing::debug!("replace_content for unknown id '{}', dropped", message_id);
                    return;
                }
            }
        }
        // The placeholder only exists locally
        if message_id == PLACEHOLDER_MESSAGE_ID {
            return;
        }
        let Some(snapshot) = self.session.snapshot().await else {
            return;
        };
        if let Err(e) = self
            .repo
            .update_content(&snapshot.user_id, message_id, content)
            .await
        {
            tracing::warn!("content update for '{}' failed: {}", message_id, e);
        }
    }

    /// Deletes the persisted transcript and resets the mirror to the
    /// placeholder. The deletion is irreversible; confirmation is the
    /// caller's responsibility.
    pub async fn clear(&self) -> Result<()> {
        let snapshot = self
            .session
            .snapshot()
            .await
            .ok_or(LumaError::IdentityUnavailable)?;
        let epoch = snapshot.epoch;

        self.repo.delete_by_owner(&snapshot.user_id).await.map_err(|e| {
            tracing::warn!("transcript clear failed: {}", e);
            e
        })?;

        if self.session.current_epoch() == epoch {
            *self.messages.write().await = vec![Message::placeholder(
                &snapshot.user_id,
                &self.placeholder_text,
            )];
        }
        Ok(())
    }

    /// Stops the pump and empties the mirror. Called on sign-out.
    pub async fn stop(&self) {
        self.stop_pump().await;
        self.messages.write().await.clear();
        *self.state.write().await = SyncState::Unbound;
    }

    async fn stop_pump(&self) {
        if let Some((token, handle)) = self.pump.lock().await.take() {
            token.cancel();
            if let Err(e) = handle.await {
                tracing::warn!("realtime pump join failed: {}", e);
            }
        }
    }
}

/// Inserts `incoming` into the timestamp-ordered `mirror`, preserving order
/// and dropping duplicates by id.
///
/// Equal timestamps keep arrival order (insert after existing equals), so a
/// batch confirmed together stays in batch order.
fn insert_ordered(mirror: &mut Vec<Message>, incoming: Message) {
    if mirror.iter().any(|m| m.id == incoming.id) {
        return;
    }
    let position = mirror.partition_point(|m| m.created_at <= incoming.created_at);
    mirror.insert(position, incoming);
}

/// The background task that drains the realtime subscription into the
/// mirror, reconnecting with backoff when the channel drops.
struct Pump {
    session: SessionHandle,
    repo: Arc<dyn MessageRepository>,
    feed: Arc<dyn RealtimeFeed>,
    settings: RealtimeSettings,
    messages: Arc<RwLock<Vec<Message>>>,
    owner_id: String,
    epoch: u64,
    token: CancellationToken,
}

enum PumpStep {
    Cancelled,
    Received(Option<RealtimeEvent>),
}

impl Pump {
    async fn run(self, mut subscription: Option<Box<dyn RealtimeSubscription>>) {
        loop {
            let step = {
                let sub = match subscription.as_mut() {
                    Some(sub) => sub,
                    None => match self.reconnect().await {
                        Some(fresh) => subscription.insert(fresh),
                        None => break,
                    },
                };
                tokio::select! {
                    _ = self.token.cancelled() => PumpStep::Cancelled,
                    event = sub.recv() => PumpStep::Received(event),
                }
            };
            match step {
                PumpStep::Cancelled => break,
                PumpStep::Received(Some(event)) => {
                    if self.session.current_epoch() != self.epoch {
                        tracing::debug!("realtime event for superseded session, pump exiting");
                        break;
                    }
                    self.apply(event).await;
                }
                PumpStep::Received(None) => {
                    tracing::warn!("realtime channel dropped for '{}'", self.owner_id);
                    subscription = None;
                }
            }
        }
        if let Some(mut sub) = subscription {
            if let Err(e) = sub.unsubscribe().await {
                tracing::warn!("unsubscribe failed: {}", e);
            }
        }
    }

    /// Merges one realtime event into the mirror.
    ///
    /// Inserts are positioned by timestamp with id-dedup (absorbing echoes
    /// of local appends). Updates replace content in place; an update for a
    /// row the mirror does not hold is dropped, the next resync reconciles.
    async fn apply(&self, event: RealtimeEvent) {
        let mut mirror = self.messages.write().await;
        match event {
            RealtimeEvent::Insert(message) => {
                mirror.retain(|m| m.id != PLACEHOLDER_MESSAGE_ID);
                insert_ordered(&mut mirror, message);
            }
            RealtimeEvent::Update(message) => {
                match mirror.iter_mut().find(|m| m.id == message.id) {
                    Some(existing) => existing.content = message.content,
                    None => {
                        tracing::debug!("update for unmirrored id '{}', dropped", message.id)
                    }
                }
            }
        }
    }

    /// Resubscribes with exponential backoff, then performs a full resync to
    /// cover events missed while disconnected.
    ///
    /// Returns `None` when cancelled, superseded, or out of retries; the
    /// transcript then stays readable but no longer receives live updates.
    async fn reconnect(&self) -> Option<Box<dyn RealtimeSubscription>> {
        let mut delay = Duration::from_millis(self.settings.initial_backoff_ms);
        let cap = Duration::from_millis(self.settings.max_backoff_ms);
        for attempt in 1..=self.settings.max_retries {
            tokio::select! {
                _ = self.token.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
            if self.session.current_epoch() != self.epoch {
                return None;
            }
            match self.feed.subscribe(&self.owner_id).await {
                Ok(sub) => {
                    tracing::info!(
                        "realtime channel restored for '{}' (attempt {})",
                        self.owner_id,
                        attempt
                    );
                    self.resync().await;
                    return Some(sub);
                }
                Err(e) => {
                    tracing::warn!("resubscribe attempt {} failed: {}", attempt, e);
                    delay = (delay * 2).min(cap);
                }
            }
        }
        tracing::error!(
            "realtime channel for '{}' stayed down after {} attempts",
            self.owner_id,
            self.settings.max_retries
        );
        None
    }

    /// Rebuilds the mirror from the store after a reconnect.
    async fn resync(&self) {
        match self.repo.list_by_owner(&self.owner_id).await {
            Ok(rows) => {
                if self.session.current_epoch() != self.epoch {
                    return;
                }
                let mut mirror = self.messages.write().await;
                if rows.is_empty() {
                    // Keep whatever the mirror holds (possibly the
                    // placeholder) rather than blanking it
                    return;
                }
                *mirror = rows;
            }
            Err(e) => tracing::warn!("post-reconnect resync failed: {}", e),
        }
    }
}
