//! Local identity provider.
//!
//! A minimal in-process implementation of the consumed auth surface, used by
//! tests and local development. Real deployments adapt the hosted identity
//! provider's callback onto the same trait.

use async_trait::async_trait;
use luma_core::error::Result;
use luma_core::identity::{AuthEvent, Identity, IdentityProvider};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// In-process identity provider with explicit event emission.
#[derive(Default)]
pub struct LocalIdentityProvider {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<AuthEvent>>>,
}

impl LocalIdentityProvider {
    /// Creates a provider with no signed-in identity.
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&self, event: AuthEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("identity subscriber lock poisoned");
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }

    /// Emits a signed-in transition for `id`/`email`.
    pub fn emit_signed_in(&self, id: &str, email: &str) {
        self.emit(AuthEvent::SignedIn(Identity {
            id: id.to_string(),
            email: email.to_string(),
        }));
    }

    /// Emits a signed-out transition.
    pub fn emit_signed_out(&self) {
        self.emit(AuthEvent::SignedOut);
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<AuthEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("identity subscriber lock poisoned")
            .push(sender);
        receiver
    }

    async fn sign_out(&self) -> Result<()> {
        self.emit_signed_out();
        Ok(())
    }
}
