//! Infrastructure layer of the LUMA sync core.
//!
//! Concrete implementations of the domain traits: directory-backed profile
//! and message repositories, the in-process realtime hub, a local identity
//! provider, configuration loading, and the consent flag.

pub mod config_service;
pub mod consent;
pub mod dir_message_repository;
pub mod dir_profile_repository;
pub mod identity_service;
pub mod paths;
pub mod realtime_hub;

pub use crate::config_service::ConfigService;
pub use crate::consent::ConsentFlag;
pub use crate::dir_message_repository::DirMessageRepository;
pub use crate::dir_profile_repository::DirProfileRepository;
pub use crate::identity_service::LocalIdentityProvider;
pub use crate::realtime_hub::RealtimeHub;
