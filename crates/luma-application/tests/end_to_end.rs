//! Full-stack exercise over the directory-backed infrastructure: sign-in,
//! hydration, transcript append and reload, debit, checkout credit, and
//! transcript clear.

use luma_application::session::{IdentityBinder, SessionOrchestrator};
use luma_application::transcript::SyncState;
use luma_core::config::LumaConfig;
use luma_core::profile::Tier;
use luma_core::session::HydrationState;
use luma_core::transcript::{MessageDraft, MessageRole, PLACEHOLDER_MESSAGE_ID};
use luma_infrastructure::{
    DirMessageRepository, DirProfileRepository, LocalIdentityProvider, RealtimeHub,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn wait_until<F, Fut>(mut cond: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if cond().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn build_stack(base: &TempDir) -> (Arc<SessionOrchestrator>, Arc<LocalIdentityProvider>) {
    let hub = RealtimeHub::new();
    let profile_repo = Arc::new(
        DirProfileRepository::new(base.path().join("profiles"))
            .await
            .unwrap(),
    );
    let message_repo = Arc::new(
        DirMessageRepository::new(base.path().join("messages"), Some(hub.clone()))
            .await
            .unwrap(),
    );
    let orchestrator = Arc::new(SessionOrchestrator::new(
        profile_repo,
        message_repo,
        Arc::new(hub),
        LumaConfig::default(),
    ));

    let provider = Arc::new(LocalIdentityProvider::new());
    IdentityBinder::new(provider.clone(), orchestrator.clone()).spawn();
    (orchestrator, provider)
}

async fn wait_hydrated(orchestrator: &Arc<SessionOrchestrator>) {
    let orch = orchestrator.clone();
    let ok = wait_until(move || {
        let orch = orch.clone();
        async move {
            let hydrated = orch
                .session()
                .snapshot()
                .await
                .map(|s| s.hydration == HydrationState::Hydrated)
                .unwrap_or(false);
            hydrated && orch.transcript().state().await == SyncState::Live
        }
    })
    .await;
    assert!(ok, "session should hydrate and transcript should go live");
}

#[tokio::test]
async fn test_sign_in_hydrate_chat_and_spend() {
    let base = TempDir::new().unwrap();
    let (orchestrator, provider) = build_stack(&base).await;

    // Sign in; provisional first, then hydrated with the initial grant
    provider.emit_signed_in("user-1", "someone@example.com");
    wait_hydrated(&orchestrator).await;

    let session = orchestrator.session().snapshot().await.unwrap();
    assert_eq!(session.profile.points, 5000);
    assert_eq!(session.profile.tier, Tier::Free);
    assert!(!session.profile.is_admin);

    // Empty transcript renders the placeholder
    let mirror = orchestrator.transcript().messages().await;
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0].id, PLACEHOLDER_MESSAGE_ID);

    // A chat turn replaces the placeholder with two persisted rows
    let rows = orchestrator
        .transcript()
        .append(vec![
            MessageDraft::user("What's the weather like?"),
            MessageDraft::assistant("I can't check live weather yet."),
        ])
        .await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].role, MessageRole::User);

    // The hub echoes both inserts; dedup keeps the mirror at two rows
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mirror = orchestrator.transcript().messages().await;
    assert_eq!(mirror.len(), 2);
    assert!(mirror.iter().all(|m| m.id != PLACEHOLDER_MESSAGE_ID));

    // Spending points persists the new balance
    orchestrator.ledger().debit(300).await.unwrap();
    let session = orchestrator.session().snapshot().await.unwrap();
    assert_eq!(session.profile.points, 4700);

    // Checkout credits points and upgrades the tier
    orchestrator
        .handle_checkout_success(Tier::Premium, 10_000)
        .await
        .unwrap();
    let session = orchestrator.session().snapshot().await.unwrap();
    assert_eq!(session.profile.points, 14_700);
    assert_eq!(session.profile.tier, Tier::Premium);

    orchestrator.unbind().await;
}

#[tokio::test]
async fn test_transcript_survives_sign_out_and_back_in() {
    let base = TempDir::new().unwrap();
    let (orchestrator, provider) = build_stack(&base).await;

    provider.emit_signed_in("user-1", "someone@example.com");
    wait_hydrated(&orchestrator).await;
    orchestrator
        .transcript()
        .append(vec![MessageDraft::user("remember me")])
        .await;

    // Sign out tears the mirror down
    provider.emit_signed_out();
    let orch = orchestrator.clone();
    let ok = wait_until(move || {
        let orch = orch.clone();
        async move { orch.session().snapshot().await.is_none() }
    })
    .await;
    assert!(ok);
    assert_eq!(orchestrator.transcript().state().await, SyncState::Unbound);

    // Signing back in reloads the persisted log, balance reflects the
    // profile row rather than a fresh grant
    provider.emit_signed_in("user-1", "someone@example.com");
    wait_hydrated(&orchestrator).await;

    let mirror = orchestrator.transcript().messages().await;
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0].content, "remember me");
    assert_eq!(
        orchestrator.session().snapshot().await.unwrap().profile.points,
        5000
    );

    orchestrator.unbind().await;
}

#[tokio::test]
async fn test_clear_wipes_rows_and_restores_placeholder() {
    let base = TempDir::new().unwrap();
    let (orchestrator, provider) = build_stack(&base).await;

    provider.emit_signed_in("user-1", "someone@example.com");
    wait_hydrated(&orchestrator).await;
    orchestrator
        .transcript()
        .append(vec![
            MessageDraft::user("one"),
            MessageDraft::assistant("two"),
        ])
        .await;

    orchestrator.transcript().clear().await.unwrap();

    let mirror = orchestrator.transcript().messages().await;
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0].id, PLACEHOLDER_MESSAGE_ID);

    // The deletion is persisted: a fresh sign-in sees an empty log
    provider.emit_signed_out();
    let orch = orchestrator.clone();
    let ok = wait_until(move || {
        let orch = orch.clone();
        async move { orch.session().snapshot().await.is_none() }
    })
    .await;
    assert!(ok);
    provider.emit_signed_in("user-1", "someone@example.com");
    wait_hydrated(&orchestrator).await;
    let mirror = orchestrator.transcript().messages().await;
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0].id, PLACEHOLDER_MESSAGE_ID);

    orchestrator.unbind().await;
}

#[tokio::test]
async fn test_admin_sign_in_gets_admin_tier() {
    let base = TempDir::new().unwrap();
    let (orchestrator, provider) = build_stack(&base).await;

    provider.emit_signed_in("admin-1", "Admin@Luma.Chat");
    wait_hydrated(&orchestrator).await;

    let session = orchestrator.session().snapshot().await.unwrap();
    assert!(session.profile.is_admin);
    assert_eq!(session.profile.tier, Tier::Admin);

    // Admin debits are waived
    orchestrator.ledger().debit(1_000_000).await.unwrap();
    assert_eq!(
        orchestrator.session().snapshot().await.unwrap().profile.points,
        5000
    );

    orchestrator.unbind().await;
}
