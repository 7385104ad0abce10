//! In-memory fakes shared by the service unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use luma_core::error::{LumaError, Result};
use luma_core::profile::{Profile, ProfileRepository, Tier};
use luma_core::realtime::{RealtimeEvent, RealtimeFeed, RealtimeSubscription};
use luma_core::transcript::{Message, MessageDraft, MessageRepository};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Polls `cond` every 10ms for up to 2 seconds.
pub async fn wait_until<F, Fut>(mut cond: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if cond().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Profile store fake with switchable failure modes.
#[derive(Default)]
pub struct MockProfileRepository {
    rows: Mutex<HashMap<String, Profile>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    conflict_on_insert: AtomicBool,
    suppressed_finds: AtomicU32,
}

impl MockProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: Profile) -> Self {
        let repo = Self::default();
        repo.install_profile(profile);
        repo
    }

    pub fn install_profile(&self, profile: Profile) {
        self.rows
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile);
    }

    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        self.rows.lock().unwrap().get(user_id).cloned()
    }

    pub fn set_points(&self, user_id: &str, points: i64) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(user_id) {
            row.points = points;
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_conflict_on_insert(&self, conflict: bool) {
        self.conflict_on_insert.store(conflict, Ordering::SeqCst);
    }

    /// Makes the next `count` finds return `Ok(None)` even if a row exists.
    /// Simulates the gap a concurrent session slips its insert into.
    pub fn suppress_next_finds(&self, count: u32) {
        self.suppressed_finds.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileRepository for MockProfileRepository {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LumaError::fetch("profile", "mock read failure"));
        }
        if self
            .suppressed_finds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(None);
        }
        Ok(self.rows.lock().unwrap().get(user_id).cloned())
    }

    async fn insert(&self, profile: &Profile) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LumaError::persist("profile", "mock write failure"));
        }
        if self.conflict_on_insert.load(Ordering::SeqCst) {
            return Err(LumaError::conflict(&profile.user_id));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&profile.user_id) {
            return Err(LumaError::conflict(&profile.user_id));
        }
        rows.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LumaError::persist("profile", "mock write failure"));
        }
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&profile.user_id) {
            return Err(LumaError::persist("profile", "no row to update"));
        }
        rows.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn update_points_cas(
        &self,
        user_id: &str,
        expected: i64,
        new_points: i64,
        tier: Option<Tier>,
    ) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LumaError::persist("profile", "mock write failure"));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(user_id)
            .ok_or_else(|| LumaError::persist("profile", "no row for CAS"))?;
        if row.points != expected {
            return Ok(false);
        }
        row.points = new_points;
        if let Some(tier) = tier {
            row.tier = tier;
        }
        Ok(true)
    }
}

/// Message store fake with deterministic ids and timestamps.
#[derive(Default)]
pub struct MockMessageRepository {
    rows: Mutex<HashMap<String, Vec<Message>>>,
    counter: AtomicI64,
    update_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

const MOCK_EPOCH_SECS: i64 = 1_700_000_000;

impl MockMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn timestamp(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(MOCK_EPOCH_SECS + offset_secs, 0).unwrap()
    }

    /// Builds a row with a fresh id and a timestamp `offset_secs` past the
    /// mock epoch, without storing it.
    pub fn build_message(
        &self,
        owner_id: &str,
        role: luma_core::transcript::MessageRole,
        content: &str,
        offset_secs: i64,
    ) -> Message {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Message {
            id: format!("msg-{}", n),
            role,
            content: content.to_string(),
            created_at: Self::timestamp(offset_secs),
            owner_id: owner_id.to_string(),
        }
    }

    /// Stores a row directly, bypassing `insert_batch`.
    pub async fn seed_row(
        &self,
        owner_id: &str,
        role: luma_core::transcript::MessageRole,
        content: &str,
        offset_secs: i64,
    ) -> Message {
        let message = self.build_message(owner_id, role, content, offset_secs);
        self.rows
            .lock()
            .unwrap()
            .entry(owner_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    pub fn rows(&self, owner_id: &str) -> Vec<Message> {
        self.rows
            .lock()
            .unwrap()
            .get(owner_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageRepository for MockMessageRepository {
    async fn insert_batch(
        &self,
        owner_id: &str,
        drafts: Vec<MessageDraft>,
    ) -> Result<Vec<Message>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LumaError::persist("message", "mock write failure"));
        }
        let mut inserted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            inserted.push(Message {
                id: format!("msg-{}", n),
                role: draft.role,
                content: draft.content,
                created_at: Self::timestamp(n),
                owner_id: owner_id.to_string(),
            });
        }
        self.rows
            .lock()
            .unwrap()
            .entry(owner_id.to_string())
            .or_default()
            .extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Message>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LumaError::fetch("message", "mock read failure"));
        }
        let mut rows = self.rows(owner_id);
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn update_content(&self, owner_id: &str, message_id: &str, content: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LumaError::persist("message", "mock write failure"));
        }
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows
            .get_mut(owner_id)
            .and_then(|list| list.iter_mut().find(|m| m.id == message_id))
        {
            row.content = content.to_string();
        }
        Ok(())
    }

    async fn delete_by_owner(&self, owner_id: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LumaError::persist("message", "mock write failure"));
        }
        self.rows.lock().unwrap().remove(owner_id);
        Ok(())
    }
}

/// Realtime feed fake built on unbounded channels.
#[derive(Clone, Default)]
pub struct MockFeed {
    inner: std::sync::Arc<MockFeedInner>,
}

#[derive(Default)]
struct MockFeedInner {
    topics: Mutex<HashMap<String, Vec<(u64, mpsc::UnboundedSender<RealtimeEvent>)>>>,
    next_token: AtomicU64,
    fail_subscribes: AtomicBool,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, owner_id: &str, event: RealtimeEvent) {
        let mut topics = self.inner.topics.lock().unwrap();
        if let Some(subscribers) = topics.get_mut(owner_id) {
            subscribers.retain(|(_, sender)| sender.send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self, owner_id: &str) -> usize {
        self.inner
            .topics
            .lock()
            .unwrap()
            .get(owner_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Closes every open subscription for `owner_id`, simulating a dropped
    /// channel.
    pub fn drop_subscribers(&self, owner_id: &str) {
        self.inner.topics.lock().unwrap().remove(owner_id);
    }

    pub fn set_fail_subscribes(&self, fail: bool) {
        self.inner.fail_subscribes.store(fail, Ordering::SeqCst);
    }
}

impl MockFeedInner {
    fn remove(&self, owner_id: &str, token: u64) {
        let mut topics = self.topics.lock().unwrap();
        if let Some(subscribers) = topics.get_mut(owner_id) {
            subscribers.retain(|(t, _)| *t != token);
            if subscribers.is_empty() {
                topics.remove(owner_id);
            }
        }
    }
}

struct MockSubscription {
    feed: std::sync::Arc<MockFeedInner>,
    owner_id: String,
    token: u64,
    receiver: mpsc::UnboundedReceiver<RealtimeEvent>,
}

#[async_trait]
impl RealtimeSubscription for MockSubscription {
    async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.recv().await
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        self.feed.remove(&self.owner_id, self.token);
        Ok(())
    }
}

#[async_trait]
impl RealtimeFeed for MockFeed {
    async fn subscribe(&self, owner_id: &str) -> Result<Box<dyn RealtimeSubscription>> {
        if self.inner.fail_subscribes.load(Ordering::SeqCst) {
            return Err(LumaError::realtime("mock subscribe failure"));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        self.inner
            .topics
            .lock()
            .unwrap()
            .entry(owner_id.to_string())
            .or_default()
            .push((token, sender));
        Ok(Box::new(MockSubscription {
            feed: self.inner.clone(),
            owner_id: owner_id.to_string(),
            token,
            receiver,
        }))
    }
}
