//! Session orchestration.
//!
//! Owns the bind/unbind lifecycle: installing the provisional session on
//! sign-in, kicking off background hydration and transcript sync, and
//! tearing everything down on sign-out.

use crate::ledger::Ledger;
use crate::profile_service::ProfileService;
use crate::transcript::TranscriptSynchronizer;
use luma_core::config::LumaConfig;
use luma_core::error::Result;
use luma_core::identity::Identity;
use luma_core::profile::{Profile, ProfileRepository, Tier};
use luma_core::realtime::RealtimeFeed;
use luma_core::session::SessionHandle;
use luma_core::transcript::MessageRepository;
use std::sync::Arc;

/// Wires the session handle, ledger, profile service, and transcript
/// synchronizer together and drives them from auth-state transitions.
pub struct SessionOrchestrator {
    session: SessionHandle,
    ledger: Ledger,
    profiles: ProfileService,
    transcript: Arc<TranscriptSynchronizer>,
}

impl SessionOrchestrator {
    /// Builds the full service graph over the given stores and feed.
    pub fn new(
        profile_repo: Arc<dyn ProfileRepository>,
        message_repo: Arc<dyn MessageRepository>,
        feed: Arc<dyn RealtimeFeed>,
        config: LumaConfig,
    ) -> Self {
        let session = SessionHandle::new();
        let ledger = Ledger::new(session.clone(), profile_repo.clone());
        let profiles = ProfileService::new(session.clone(), profile_repo, config.clone());
        let transcript = Arc::new(TranscriptSynchronizer::new(
            session.clone(),
            message_repo,
            feed,
            config.realtime,
            config.placeholder_message,
        ));
        Self {
            session,
            ledger,
            profiles,
            transcript,
        }
    }

    /// Binds `identity` and returns immediately.
    ///
    /// The provisional session is installed synchronously so the caller can
    /// render right away; profile hydration and the transcript load run in
    /// a detached background task.
    pub async fn bind_identity(&self, identity: &Identity) {
        tracing::info!("binding identity '{}'", identity.id);
        self.session
            .bind(&identity.id, &identity.email, Profile::provisional(&identity.id))
            .await;

        let profiles = self.profiles.clone();
        let transcript = self.transcript.clone();
        tokio::spawn(async move {
            tokio::join!(profiles.hydrate(), async {
                if let Err(e) = transcript.start().await {
                    tracing::warn!("transcript start failed: {}", e);
                }
            });
        });
    }

    /// Clears the session and stops transcript sync. In-flight store
    /// responses for the old identity are fenced out by the epoch bump.
    pub async fn unbind(&self) {
        tracing::info!("unbinding session");
        self.session.clear().await;
        self.transcript.stop().await;
    }

    /// Applies a completed checkout: credits the granted points and moves
    /// the profile to the purchased tier.
    pub async fn handle_checkout_success(&self, tier: Tier, points_granted: i64) -> Result<()> {
        self.ledger.credit(tier, points_granted).await
    }

    /// The shared session handle.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The points ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The profile service.
    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    /// The transcript synchronizer.
    pub fn transcript(&self) -> &Arc<TranscriptSynchronizer> {
        &self.transcript
    }
}
