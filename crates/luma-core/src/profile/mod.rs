//! Profile domain: model and repository trait.

pub mod model;
pub mod repository;

pub use model::{default_personalization, Profile, Tier, REQUIRED_PERSONALIZATION};
pub use repository::ProfileRepository;
