//! Error types for the LUMA sync core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire sync core.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. The taxonomy mirrors the
/// failure modes of the synchronization layer: fetches, persists, the
/// realtime channel, and the two caller-actionable conditions
/// (`InsufficientFunds` and `ConflictOnCreate`).
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum LumaError {
    /// No signed-in identity is available for the requested operation
    #[error("Identity unavailable: no signed-in session")]
    IdentityUnavailable,

    /// A remote read failed (profile row or transcript load)
    #[error("Fetch failed for {resource}: {message}")]
    Fetch {
        resource: &'static str,
        message: String,
    },

    /// A remote write failed (ledger, profile, or transcript)
    #[error("Persist failed for {resource}: {message}")]
    Persist {
        resource: &'static str,
        message: String,
    },

    /// The realtime push channel reported an error
    #[error("Realtime channel error: {0}")]
    RealtimeChannel(String),

    /// A debit was requested for more points than the balance holds.
    ///
    /// Carries both sides of the comparison so the caller can build an
    /// upgrade prompt.
    #[error("Insufficient points: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    /// A profile insert raced with another session's insert for the same
    /// identity. Recoverable by re-fetching the winning row.
    #[error("Profile already exists for identity '{id}'")]
    ConflictOnCreate { id: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LumaError {
    /// Creates a Fetch error
    pub fn fetch(resource: &'static str, message: impl Into<String>) -> Self {
        Self::Fetch {
            resource,
            message: message.into(),
        }
    }

    /// Creates a Persist error
    pub fn persist(resource: &'static str, message: impl Into<String>) -> Self {
        Self::Persist {
            resource,
            message: message.into(),
        }
    }

    /// Creates a RealtimeChannel error
    pub fn realtime(message: impl Into<String>) -> Self {
        Self::RealtimeChannel(message.into())
    }

    /// Creates a ConflictOnCreate error
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::ConflictOnCreate { id: id.into() }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is an InsufficientFunds error
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Self::InsufficientFunds { .. })
    }

    /// Check if this is a ConflictOnCreate error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConflictOnCreate { .. })
    }

    /// Check if this is a Fetch error
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// Check if this is a Persist error
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist { .. })
    }
}

impl From<std::io::Error> for LumaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for LumaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for LumaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for LumaError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at infrastructure edges)
impl From<anyhow::Error> for LumaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, LumaError>`.
pub type Result<T> = std::result::Result<T, LumaError>;
