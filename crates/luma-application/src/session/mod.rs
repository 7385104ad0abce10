//! Session lifecycle services.

pub mod binder;
pub mod orchestrator;

pub use binder::IdentityBinder;
pub use orchestrator::SessionOrchestrator;
