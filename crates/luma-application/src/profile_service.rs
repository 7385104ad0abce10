//! Profile hydration and personalization.
//!
//! Hydration replaces the provisional profile stub with the authoritative
//! row (creating it on first sign-in) without ever blocking the caller.
//! Personalization and saved-items writes are confirm-then-apply: the store
//! is updated first, and the local view only changes once the write
//! succeeded.

use luma_core::config::LumaConfig;
use luma_core::error::{LumaError, Result};
use luma_core::profile::{Profile, ProfileRepository};
use luma_core::session::{HydrationState, SessionHandle};
use std::collections::HashMap;
use std::sync::Arc;

/// Hydrates and edits the per-identity profile.
#[derive(Clone)]
pub struct ProfileService {
    session: SessionHandle,
    profiles: Arc<dyn ProfileRepository>,
    config: LumaConfig,
}

impl ProfileService {
    /// Creates a profile service over the shared session and profile store.
    pub fn new(
        session: SessionHandle,
        profiles: Arc<dyn ProfileRepository>,
        config: LumaConfig,
    ) -> Self {
        Self {
            session,
            profiles,
            config,
        }
    }

    /// Replaces the provisional profile with the authoritative row.
    ///
    /// Runs in the background after bind. Never returns an error: any
    /// failure leaves the session on its provisional stub (and therefore in
    /// `ProvisionalReady`), which is a valid state to keep operating from.
    /// A response landing after the identity changed is discarded by the
    /// epoch fence.
    pub async fn hydrate(&self) {
        let epoch = self.session.current_epoch();
        let Some(snapshot) = self.session.snapshot().await else {
            tracing::debug!("hydrate skipped: no bound session");
            return;
        };

        match self.load_or_create(&snapshot.user_id, &snapshot.email).await {
            Ok(profile) => {
                let applied = self
                    .session
                    .update_if_current(epoch, |s| {
                        s.profile = profile;
                        s.hydration = HydrationState::Hydrated;
                    })
                    .await;
                if applied {
                    tracing::info!("profile hydrated for '{}'", snapshot.user_id);
                } else {
                    tracing::debug!(
                        "hydration result for '{}' discarded: identity changed",
                        snapshot.user_id
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "hydration failed for '{}', keeping provisional profile: {}",
                    snapshot.user_id,
                    e
                );
            }
        }
    }

    /// Loads the profile row, creating it on first sign-in.
    ///
    /// An existing row gets its required personalization keys back-filled,
    /// with a best-effort repair write-back. An insert that loses the race
    /// against a concurrent session recovers by re-fetching the winning row.
    async fn load_or_create(&self, user_id: &str, email: &str) -> Result<Profile> {
        if let Some(mut profile) = self.profiles.find_by_user_id(user_id).await? {
            if profile.backfill_personalization() {
                if let Err(e) = self.profiles.update(&profile).await {
                    tracing::warn!("personalization back-fill write failed: {}", e);
                }
            }
            return Ok(profile);
        }

        let fresh = Profile::new_for_signup(
            user_id,
            email,
            &self.config.admin_emails,
            self.config.initial_points_grant,
        );
        match self.profiles.insert(&fresh).await {
            Ok(()) => {
                tracing::info!("created profile for '{}'", user_id);
                Ok(fresh)
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!("insert race for '{}', fetching winning row", user_id);
                self.profiles
                    .find_by_user_id(user_id)
                    .await?
                    .ok_or_else(|| {
                        LumaError::internal("profile vanished after insert conflict")
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Merges `patch` into the personalization map, shallow, last-writer-wins
    /// per key. Keys absent from the patch are untouched.
    ///
    /// The store write happens first; the local view is only replaced from
    /// the confirmed row, so a failed write leaves the session unchanged.
    pub async fn merge_patch_personalization(
        &self,
        patch: HashMap<String, String>,
    ) -> Result<()> {
        let epoch = self.session.current_epoch();
        let mut row = self.fetch_row().await?;
        for (key, value) in patch {
            row.personalization.insert(key, value);
        }
        self.profiles.update(&row).await.map_err(|e| {
            tracing::warn!("personalization patch failed: {}", e);
            e
        })?;

        let confirmed = row.personalization.clone();
        self.session
            .update_if_current(epoch, |s| s.profile.personalization = confirmed)
            .await;
        Ok(())
    }

    /// Sets the assistant language. Thin wrapper over the merge-patch.
    pub async fn set_language(&self, language: &str) -> Result<()> {
        let patch = HashMap::from([("language".to_string(), language.to_string())]);
        self.merge_patch_personalization(patch).await
    }

    /// Appends `item` to the saved-items list, preserving set semantics.
    /// A duplicate is a silent no-op.
    pub async fn add_saved_item(&self, item: &str) -> Result<()> {
        let epoch = self.session.current_epoch();
        let mut row = self.fetch_row().await?;
        if row.saved_items.iter().any(|existing| existing == item) {
            tracing::debug!("saved item already present, skipping");
            return Ok(());
        }
        row.saved_items.push(item.to_string());
        self.profiles.update(&row).await?;

        let confirmed = row.saved_items.clone();
        self.session
            .update_if_current(epoch, |s| s.profile.saved_items = confirmed)
            .await;
        Ok(())
    }

    /// Removes the saved item at `index`. An out-of-range index is a logged
    /// no-op, not an error.
    pub async fn remove_saved_item(&self, index: usize) -> Result<()> {
        let epoch = self.session.current_epoch();
        let mut row = self.fetch_row().await?;
        if index >= row.saved_items.len() {
            tracing::warn!(
                "saved item index {} out of range ({} items), ignoring",
                index,
                row.saved_items.len()
            );
            return Ok(());
        }
        row.saved_items.remove(index);
        self.profiles.update(&row).await?;

        let confirmed = row.saved_items.clone();
        self.session
            .update_if_current(epoch, |s| s.profile.saved_items = confirmed)
            .await;
        Ok(())
    }

    /// Fetches the current identity's row, failing if none is bound or the
    /// row is missing.
    async fn fetch_row(&self) -> Result<Profile> {
        let snapshot = self
            .session
            .snapshot()
            .await
            .ok_or(LumaError::IdentityUnavailable)?;
        self.profiles
            .find_by_user_id(&snapshot.user_id)
            .await?
            .ok_or_else(|| LumaError::fetch("profile", "no row for bound identity"))
    }
}
