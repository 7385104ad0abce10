//! Directory-backed ProfileRepository implementation.
//!
//! One JSON file per identity under `<base>/profiles/`. Writes go through a
//! temp-file-then-rename step so a crash never leaves a half-written row,
//! and an internal mutex gives `insert` and `update_points_cas` the same
//! conditional semantics a remote row store would enforce server-side.

use anyhow::Context;
use async_trait::async_trait;
use luma_core::error::{LumaError, Result};
use luma_core::profile::{Profile, ProfileRepository, Tier};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Directory-backed profile repository.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── profiles/
///     ├── user-id-1.json
///     └── user-id-2.json
/// ```
pub struct DirProfileRepository {
    profiles_dir: PathBuf,
    /// Serializes conditional writes (insert-if-absent, compare-and-set).
    write_lock: Mutex<()>,
}

impl DirProfileRepository {
    /// Creates a DirProfileRepository at the default location
    /// (`~/.local/share/luma/profiles`).
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined or the
    /// directory structure cannot be created.
    pub async fn default_location() -> Result<Self> {
        use crate::paths::LumaPaths;
        let dir = LumaPaths::profiles_dir().map_err(|e| LumaError::config(e.to_string()))?;
        Self::new(dir).await
    }

    /// Creates a new DirProfileRepository rooted at `profiles_dir`.
    pub async fn new(profiles_dir: impl AsRef<Path>) -> Result<Self> {
        let profiles_dir = profiles_dir.as_ref().to_path_buf();
        fs::create_dir_all(&profiles_dir)
            .await
            .context("Failed to create profiles directory")
            .map_err(|e| LumaError::Io {
                message: e.to_string(),
            })?;
        Ok(Self {
            profiles_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn row_path(&self, user_id: &str) -> PathBuf {
        self.profiles_dir.join(format!("{}.json", user_id))
    }

    async fn load(&self, user_id: &str) -> Result<Option<Profile>> {
        let path = self.row_path(user_id);
        match fs::read_to_string(&path).await {
            Ok(raw) => {
                let profile = serde_json::from_str(&raw)?;
                Ok(Some(profile))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LumaError::fetch("profile", e.to_string())),
        }
    }

    async fn store(&self, profile: &Profile) -> Result<()> {
        let path = self.row_path(&profile.user_id);
        let tmp = path.with_extension("json.tmp");
        let rendered = serde_json::to_string_pretty(profile)?;
        fs::write(&tmp, rendered)
            .await
            .map_err(|e| LumaError::persist("profile", e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| LumaError::persist("profile", e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for DirProfileRepository {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>> {
        self.load(user_id).await
    }

    async fn insert(&self, profile: &Profile) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if fs::try_exists(self.row_path(&profile.user_id))
            .await
            .map_err(|e| LumaError::persist("profile", e.to_string()))?
        {
            return Err(LumaError::conflict(&profile.user_id));
        }
        self.store(profile).await
    }

    async fn update(&self, profile: &Profile) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.load(&profile.user_id).await?.is_none() {
            return Err(LumaError::persist(
                "profile",
                format!("no row for identity '{}'", profile.user_id),
            ));
        }
        let mut row = profile.clone();
        row.updated_at = chrono::Utc::now().to_rfc3339();
        self.store(&row).await
    }

    async fn update_points_cas(
        &self,
        user_id: &str,
        expected: i64,
        new_points: i64,
        tier: Option<Tier>,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut row) = self.load(user_id).await? else {
            return Err(LumaError::persist(
                "profile",
                format!("no row for identity '{}'", user_id),
            ));
        };
        if row.points != expected {
            return Ok(false);
        }
        row.points = new_points;
        if let Some(tier) = tier {
            row.tier = tier;
        }
        row.updated_at = chrono::Utc::now().to_rfc3339();
        self.store(&row).await?;
        Ok(true)
    }
}
