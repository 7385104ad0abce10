//! Application layer of the LUMA sync core.
//!
//! The services that keep the local session view consistent with the
//! backing store: the points ledger, profile hydration and personalization,
//! transcript synchronization, and the session orchestrator that ties them
//! to auth-state transitions.

pub mod ledger;
pub mod profile_service;
pub mod session;
pub mod transcript;
pub mod txn;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::ledger::Ledger;
pub use crate::profile_service::ProfileService;
pub use crate::session::{IdentityBinder, SessionOrchestrator};
pub use crate::transcript::{SyncState, TranscriptSynchronizer};
