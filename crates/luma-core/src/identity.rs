//! Identity provider abstraction.
//!
//! The authentication provider itself is an external collaborator; this core
//! only consumes its auth-state transitions and exposes a sign-out call.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// An auth-state transition emitted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A user signed in (or the provider restored a prior session).
    SignedIn(Identity),
    /// The current user signed out.
    SignedOut,
}

/// The consumed surface of the authentication provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribes to auth-state transitions.
    ///
    /// Each call returns an independent receiver; events are fanned out to
    /// every live subscriber.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<AuthEvent>;

    /// Signs the current user out, which causes a `SignedOut` event.
    async fn sign_out(&self) -> Result<()>;
}
