//! Points ledger.
//!
//! Debit is the one operation in the core with true optimistic-update plus
//! compensating-rollback semantics: the action it gates (starting a paid
//! feature) must feel instantaneous, so the local balance drops before the
//! store confirms and is restored if the persist fails. Credit is its
//! confirm-then-apply counterpart, invoked only from the checkout success
//! callback.

use crate::txn::with_rollback;
use luma_core::error::{LumaError, Result};
use luma_core::profile::{ProfileRepository, Tier};
use luma_core::session::SessionHandle;
use std::sync::Arc;

/// Bounded retries for compare-and-set balance writes.
const MAX_CAS_RETRIES: u32 = 3;

/// Debit/credit operations against the current session's points balance.
pub struct Ledger {
    session: SessionHandle,
    profiles: Arc<dyn ProfileRepository>,
}

impl Ledger {
    /// Creates a ledger over the shared session and profile store.
    pub fn new(session: SessionHandle, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { session, profiles }
    }

    /// Spends `amount` points from the current balance.
    ///
    /// Admin sessions succeed unconditionally with no state change. A
    /// balance too small for `amount` fails with
    /// [`LumaError::InsufficientFunds`] and changes nothing; the caller is
    /// expected to surface an upgrade prompt. Otherwise the local balance
    /// drops immediately and the new value is persisted with a
    /// compare-and-set; persist failure rolls the local value back.
    pub async fn debit(&self, amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(LumaError::internal("debit amount must be non-negative"));
        }
        let epoch = self.session.current_epoch();
        let snapshot = self
            .session
            .snapshot()
            .await
            .ok_or(LumaError::IdentityUnavailable)?;

        if snapshot.profile.is_admin {
            tracing::debug!("debit of {} waived for admin session", amount);
            return Ok(());
        }
        let before = snapshot.profile.points;
        if amount > before {
            return Err(LumaError::InsufficientFunds {
                needed: amount,
                available: before,
            });
        }

        let confirmed = with_rollback(
            &self.session,
            epoch,
            |s| s.profile.points = before - amount,
            |s| s.profile.points = before,
            self.persist_debit(&snapshot.user_id, before, amount),
        )
        .await?;

        // On a CAS conflict the confirmed balance differs from the
        // optimistic one; align the local value with the store.
        self.session
            .update_if_current(epoch, |s| s.profile.points = confirmed)
            .await;
        tracing::debug!("debited {} points, balance now {}", amount, confirmed);
        Ok(())
    }

    /// Persists the debit with bounded CAS retries.
    ///
    /// On a stale expected value the fresh balance is re-read; if it no
    /// longer covers the debit, the whole operation fails with
    /// `InsufficientFunds` (and the optimistic local change is rolled back
    /// by the caller).
    async fn persist_debit(&self, user_id: &str, mut expected: i64, amount: i64) -> Result<i64> {
        for attempt in 0..=MAX_CAS_RETRIES {
            if attempt > 0 {
                tracing::debug!("debit CAS retry {} for '{}'", attempt, user_id);
            }
            if self
                .profiles
                .update_points_cas(user_id, expected, expected - amount, None)
                .await?
            {
                return Ok(expected - amount);
            }
            let fresh = self
                .profiles
                .find_by_user_id(user_id)
                .await?
                .ok_or_else(|| LumaError::persist("profile", "row vanished during debit"))?;
            if amount > fresh.points {
                return Err(LumaError::InsufficientFunds {
                    needed: amount,
                    available: fresh.points,
                });
            }
            expected = fresh.points;
        }
        Err(LumaError::persist("profile", "debit CAS retries exhausted"))
    }

    /// Applies a checkout success: adds `points_to_add` and sets `tier` in a
    /// single conditional read-modify-write.
    ///
    /// Unlike debit this path is not optimistic: local points and tier are
    /// replaced only from the store-confirmed values.
    pub async fn credit(&self, tier: Tier, points_to_add: i64) -> Result<()> {
        if points_to_add < 0 {
            return Err(LumaError::internal("credit amount must be non-negative"));
        }
        let epoch = self.session.current_epoch();
        let snapshot = self
            .session
            .snapshot()
            .await
            .ok_or(LumaError::IdentityUnavailable)?;

        let mut expected = snapshot.profile.points;
        for attempt in 0..=MAX_CAS_RETRIES {
            if attempt > 0 {
                tracing::debug!("credit CAS retry {} for '{}'", attempt, snapshot.user_id);
            }
            let new_points = expected + points_to_add;
            if self
                .profiles
                .update_points_cas(&snapshot.user_id, expected, new_points, Some(tier))
                .await?
            {
                let applied = self
                    .session
                    .update_if_current(epoch, |s| {
                        s.profile.points = new_points;
                        s.profile.tier = tier;
                    })
                    .await;
                if !applied {
                    tracing::debug!("credit confirmed after session was replaced; not applied locally");
                }
                tracing::info!(
                    "credited {} points (tier {}), balance now {}",
                    points_to_add,
                    tier,
                    new_points
                );
                return Ok(());
            }
            let fresh = self
                .profiles
                .find_by_user_id(&snapshot.user_id)
                .await?
                .ok_or_else(|| LumaError::persist("profile", "row vanished during credit"))?;
            expected = fresh.points;
        }
        Err(LumaError::persist("profile", "credit CAS retries exhausted"))
    }
}
