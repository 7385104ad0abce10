//! Optimistic-write helper.
//!
//! Generalizes the snapshot / apply-locally / persist / restore-on-failure
//! pattern so the one operation that needs it (the points debit) reads as a
//! single call. The local mutation and the rollback both go through the
//! epoch fence, so a rollback never lands on a session that has since been
//! replaced.

use luma_core::error::{LumaError, Result};
use luma_core::session::{Session, SessionHandle};
use std::future::Future;

/// Applies `apply` to the current session, runs `persist`, and restores the
/// prior state with `restore` if persistence fails.
///
/// Returns the persist result. If the session no longer belongs to `epoch`
/// when the local mutation is attempted, nothing happens and
/// `IdentityUnavailable` is returned. A rollback that finds the epoch moved
/// on is skipped silently: the state it would restore is already gone.
pub async fn with_rollback<T, A, R, Fut>(
    session: &SessionHandle,
    epoch: u64,
    apply: A,
    restore: R,
    persist: Fut,
) -> Result<T>
where
    A: FnOnce(&mut Session),
    R: FnOnce(&mut Session),
    Fut: Future<Output = Result<T>>,
{
    if !session.update_if_current(epoch, apply).await {
        return Err(LumaError::IdentityUnavailable);
    }
    match persist.await {
        Ok(confirmed) => Ok(confirmed),
        Err(e) => {
            if !session.update_if_current(epoch, restore).await {
                tracing::debug!("rollback skipped: session epoch moved on");
            }
            Err(e)
        }
    }
}
