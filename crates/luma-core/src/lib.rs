//! Domain layer of the LUMA sync core.
//!
//! Models, repository traits, the shared error type, and the epoch-fenced
//! session handle. Concrete backends live in `luma-infrastructure`; the
//! services that orchestrate them live in `luma-application`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod realtime;
pub mod session;
pub mod transcript;

// Re-export common error type
pub use error::{LumaError, Result};
pub use session::{HydrationState, Session, SessionHandle};
