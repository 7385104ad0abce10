//! Auth-event loop.
//!
//! Bridges the identity provider's event stream to the orchestrator: each
//! sign-in binds a session, each sign-out unbinds it.

use crate::session::orchestrator::SessionOrchestrator;
use luma_core::identity::{AuthEvent, IdentityProvider};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Drives the orchestrator from the provider's auth-state transitions.
pub struct IdentityBinder {
    events: mpsc::UnboundedReceiver<AuthEvent>,
    orchestrator: Arc<SessionOrchestrator>,
}

impl IdentityBinder {
    /// Subscribes to the provider immediately, so transitions emitted
    /// between construction and the first poll of [`run`](Self::run) are
    /// buffered rather than lost.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        orchestrator: Arc<SessionOrchestrator>,
    ) -> Self {
        Self {
            events: provider.subscribe(),
            orchestrator,
        }
    }

    /// Consumes auth events until the provider's stream closes.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                AuthEvent::SignedIn(identity) => {
                    self.orchestrator.bind_identity(&identity).await;
                }
                AuthEvent::SignedOut => {
                    self.orchestrator.unbind().await;
                }
            }
        }
        tracing::debug!("auth event stream closed, binder exiting");
    }

    /// Runs the event loop on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
