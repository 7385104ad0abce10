//! Session state and identity fencing.
//!
//! One session view exists per process and is mutated in place by many
//! concurrent asynchronous calls. Every store call captures the epoch it was
//! issued under; a response that lands after the identity changed (rapid
//! sign-out/sign-in) is detected by its stale epoch and discarded instead of
//! corrupting the new session.

use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Hydration phase of the session.
///
/// Only `Hydrated` guarantees authoritative profile fields;
/// `ProvisionalReady` guarantees the identity id and email only, with the
/// profile holding cached defaults so presentation is never blocked on
/// network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HydrationState {
    /// No identity bound.
    Unbound,
    /// Provisional stub installed; authoritative fetch still in flight.
    ProvisionalReady,
    /// Profile fields reflect the backing store.
    Hydrated,
}

/// The transient per-identity session view.
///
/// Created on a successful authentication event, destroyed on sign-out,
/// never persisted itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Identity id
    pub user_id: String,
    /// Identity email
    pub email: String,
    /// Current profile view (provisional until hydrated)
    pub profile: Profile,
    /// Which fields are trustworthy right now
    pub hydration: HydrationState,
    /// Fencing token of the bind that created this session
    pub epoch: u64,
}

/// Shared, epoch-fenced handle to the single mutable session.
///
/// The epoch counter advances on every bind and clear. Mutations go through
/// [`SessionHandle::update_if_current`], which refuses to apply a change
/// issued under a superseded epoch.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
    epoch: Arc<AtomicU64>,
}

impl SessionHandle {
    /// Creates an empty handle with no bound identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current fencing epoch.
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Returns a clone of the current session, if any.
    pub async fn snapshot(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// Installs a provisional session for `user_id`/`email`, superseding any
    /// previous identity. Returns the new epoch.
    pub async fn bind(&self, user_id: &str, email: &str, profile: Profile) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.inner.write().await;
        *guard = Some(Session {
            user_id: user_id.to_string(),
            email: email.to_string(),
            profile,
            hydration: HydrationState::ProvisionalReady,
            epoch,
        });
        epoch
    }

    /// Clears the session on sign-out, superseding any in-flight responses.
    /// Returns the new epoch.
    pub async fn clear(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.inner.write().await;
        *guard = None;
        epoch
    }

    /// Applies `mutate` to the session iff it still belongs to `epoch`.
    ///
    /// Returns `true` when the change was applied, `false` when the response
    /// was stale (identity changed since the call was issued) and discarded.
    pub async fn update_if_current<F>(&self, epoch: u64, mutate: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        if self.current_epoch() != epoch {
            return false;
        }
        let mut guard = self.inner.write().await;
        match guard.as_mut() {
            Some(session) if session.epoch == epoch => {
                mutate(session);
                true
            }
            _ => false,
        }
    }
}
