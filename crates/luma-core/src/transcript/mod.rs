//! Transcript domain: message types and repository trait.

pub mod message;
pub mod repository;

pub use message::{Message, MessageDraft, MessageRole, PLACEHOLDER_MESSAGE_ID};
pub use repository::MessageRepository;
