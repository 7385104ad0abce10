//! Configuration types for the sync core.

use serde::{Deserialize, Serialize};

/// Points granted to every newly created profile, regardless of tier.
pub const DEFAULT_INITIAL_POINTS_GRANT: i64 = 5000;

/// Root configuration for the sync core.
///
/// Loaded from `config.toml` by the infrastructure layer; every field has a
/// working default so a missing file never blocks startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumaConfig {
    /// Emails granted the Admin tier at profile creation (case-insensitive match)
    pub admin_emails: Vec<String>,
    /// Points granted when a profile row is first created
    pub initial_points_grant: i64,
    /// Content of the locally synthesized greeting shown for empty transcripts
    pub placeholder_message: String,
    /// Realtime feed reconnect policy
    pub realtime: RealtimeSettings,
}

impl Default for LumaConfig {
    fn default() -> Self {
        Self {
            admin_emails: vec!["admin@luma.chat".to_string()],
            initial_points_grant: DEFAULT_INITIAL_POINTS_GRANT,
            placeholder_message: "Hi! I'm Luma. How can I help you today?".to_string(),
            realtime: RealtimeSettings::default(),
        }
    }
}

/// Reconnect/backoff policy for the realtime feed.
///
/// On a dropped channel the synchronizer resubscribes with exponential
/// backoff and performs a full transcript resync once reconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// First retry delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound for the doubled delay
    pub max_backoff_ms: u64,
    /// Resubscribe attempts before the transcript stays degraded
    pub max_retries: u32,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            max_retries: 5,
        }
    }
}
