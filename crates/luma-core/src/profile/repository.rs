//! Profile repository trait.
//!
//! Defines the interface for profile persistence operations.

use super::model::{Profile, Tier};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for the per-identity profile collection.
///
/// This trait defines the contract for persisting and retrieving profiles,
/// decoupling the sync core from the specific backing store (a remote row
/// store in production, dir- or memory-backed implementations in tests).
///
/// # Implementation Notes
///
/// Implementations must enforce identity-id uniqueness on `insert` and
/// provide conditional-update semantics for `update_points_cas` so that
/// concurrent balance writes cannot silently lose updates.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a profile by its identity id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Profile))`: Profile found
    /// - `Ok(None)`: No row for this identity
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Inserts a newly created profile.
    ///
    /// # Errors
    ///
    /// Returns `LumaError::ConflictOnCreate` if a row for this identity
    /// already exists (e.g., a concurrent hydration from another session
    /// won the insert race).
    async fn insert(&self, profile: &Profile) -> Result<()>;

    /// Writes the whole profile row.
    ///
    /// Used by merge-patch operations and the personalization back-fill
    /// repair. Last writer wins at the row level.
    async fn update(&self, profile: &Profile) -> Result<()>;

    /// Compare-and-set on the points balance, optionally also setting tier.
    ///
    /// The write only succeeds if the stored balance still equals
    /// `expected`; otherwise no change is made and `Ok(false)` is returned
    /// so the caller can re-read and retry. This closes the lost-update
    /// window between concurrent credits and debits.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Balance (and tier, if given) written
    /// - `Ok(false)`: Stored balance no longer matches `expected`
    /// - `Err(_)`: Error occurred during the write
    async fn update_points_cas(
        &self,
        user_id: &str,
        expected: i64,
        new_points: i64,
        tier: Option<Tier>,
    ) -> Result<bool>;
}
