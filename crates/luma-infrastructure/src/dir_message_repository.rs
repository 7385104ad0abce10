//! Directory-backed MessageRepository implementation.
//!
//! One JSON file per identity under `<base>/messages/`, holding that
//! identity's ordered message log. The repository assigns UUID ids and UTC
//! timestamps on insert and publishes `Insert`/`Update` events into the
//! realtime hub after each successful write, so subscribed sessions see
//! their own appends echoed the way a remote push channel would.

use crate::realtime_hub::RealtimeHub;
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use luma_core::error::{LumaError, Result};
use luma_core::realtime::RealtimeEvent;
use luma_core::transcript::{Message, MessageDraft, MessageRepository};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Directory-backed message repository.
pub struct DirMessageRepository {
    messages_dir: PathBuf,
    hub: Option<RealtimeHub>,
    write_lock: Mutex<()>,
}

impl DirMessageRepository {
    /// Creates a DirMessageRepository at the default location
    /// (`~/.local/share/luma/messages`).
    pub async fn default_location(hub: Option<RealtimeHub>) -> Result<Self> {
        use crate::paths::LumaPaths;
        let dir = LumaPaths::messages_dir().map_err(|e| LumaError::config(e.to_string()))?;
        Self::new(dir, hub).await
    }

    /// Creates a new DirMessageRepository rooted at `messages_dir`.
    ///
    /// When `hub` is given, every successful write publishes its change
    /// event to the owner's topic.
    pub async fn new(messages_dir: impl AsRef<Path>, hub: Option<RealtimeHub>) -> Result<Self> {
        let messages_dir = messages_dir.as_ref().to_path_buf();
        fs::create_dir_all(&messages_dir)
            .await
            .context("Failed to create messages directory")
            .map_err(|e| LumaError::Io {
                message: e.to_string(),
            })?;
        Ok(Self {
            messages_dir,
            hub,
            write_lock: Mutex::new(()),
        })
    }

    fn log_path(&self, owner_id: &str) -> PathBuf {
        self.messages_dir.join(format!("{}.json", owner_id))
    }

    async fn load_log(&self, owner_id: &str) -> Result<Vec<Message>> {
        match fs::read_to_string(self.log_path(owner_id)).await {
            Ok(raw) => {
                let log = serde_json::from_str(&raw)?;
                Ok(log)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(LumaError::fetch("messages", e.to_string())),
        }
    }

    async fn store_log(&self, owner_id: &str, log: &[Message]) -> Result<()> {
        let path = self.log_path(owner_id);
        let tmp = path.with_extension("json.tmp");
        let rendered = serde_json::to_string_pretty(log)?;
        fs::write(&tmp, rendered)
            .await
            .map_err(|e| LumaError::persist("messages", e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| LumaError::persist("messages", e.to_string()))?;
        Ok(())
    }

    fn publish(&self, owner_id: &str, event: RealtimeEvent) {
        if let Some(hub) = &self.hub {
            hub.publish(owner_id, event);
        }
    }
}

#[async_trait]
impl MessageRepository for DirMessageRepository {
    async fn insert_batch(
        &self,
        owner_id: &str,
        drafts: Vec<MessageDraft>,
    ) -> Result<Vec<Message>> {
        let _guard = self.write_lock.lock().await;
        let mut log = self.load_log(owner_id).await?;

        let rows: Vec<Message> = drafts
            .into_iter()
            .map(|draft| Message {
                id: Uuid::new_v4().to_string(),
                role: draft.role,
                content: draft.content,
                created_at: Utc::now(),
                owner_id: owner_id.to_string(),
            })
            .collect();

        log.extend(rows.iter().cloned());
        self.store_log(owner_id, &log).await?;

        for row in &rows {
            self.publish(owner_id, RealtimeEvent::Insert(row.clone()));
        }
        Ok(rows)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Message>> {
        let mut log = self.load_log(owner_id).await?;
        // Stable sort: equal timestamps keep insertion order
        log.sort_by_key(|m| m.created_at);
        Ok(log)
    }

    async fn update_content(&self, owner_id: &str, message_id: &str, content: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut log = self.load_log(owner_id).await?;
        let Some(row) = log.iter_mut().find(|m| m.id == message_id) else {
            // Idempotent contract: replacing a row that no longer exists is
            // not an error worth failing a fire-and-forget path over
            tracing::debug!(
                "content update for unknown message '{}' ignored",
                message_id
            );
            return Ok(());
        };
        row.content = content.to_string();
        let updated = row.clone();
        self.store_log(owner_id, &log).await?;
        self.publish(owner_id, RealtimeEvent::Update(updated));
        Ok(())
    }

    async fn delete_by_owner(&self, owner_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.log_path(owner_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LumaError::persist("messages", e.to_string())),
        }
    }
}
