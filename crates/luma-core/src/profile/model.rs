//! Profile domain model.
//!
//! One profile exists per identity and is persisted remotely, keyed by the
//! identity id. It carries the subscription tier, the spendable points
//! balance, the personalization map, and the saved-items list.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subscription tier of a profile.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Tier {
    #[default]
    Free,
    Basic,
    Standard,
    Premium,
    Admin,
}

/// Required personalization keys and their back-fill defaults.
///
/// Every hydrated profile must carry all four keys; missing keys are filled
/// with these defaults without overwriting present values.
pub const REQUIRED_PERSONALIZATION: [(&str, &str); 4] = [
    ("Name", "Friend"),
    ("Location", ""),
    ("Interests", ""),
    ("language", "English"),
];

/// Returns a personalization map holding every required key at its default.
pub fn default_personalization() -> HashMap<String, String> {
    REQUIRED_PERSONALIZATION
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Per-identity account state.
///
/// Invariant: `points >= 0` unless `is_admin` is true. `is_admin` is set once
/// at creation and never changed by this core. `saved_items` has set
/// semantics by value: no duplicate entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity id this profile belongs to
    pub user_id: String,
    /// Subscription tier
    pub tier: Tier,
    /// Spendable points balance
    pub points: i64,
    /// Administrator flag, set once at creation
    pub is_admin: bool,
    /// Assistant personalization map (required keys back-filled on hydration)
    pub personalization: HashMap<String, String>,
    /// Ordered saved-items list with set-by-value semantics
    pub saved_items: Vec<String>,
    /// Timestamp of the last write (RFC 3339)
    pub updated_at: String,
}

impl Profile {
    /// Builds the provisional stub installed immediately on sign-in.
    ///
    /// Dependent consumers render from this while authoritative hydration
    /// runs in the background: Free tier, zero points, default
    /// personalization, empty saved-items.
    pub fn provisional(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            tier: Tier::Free,
            points: 0,
            is_admin: false,
            personalization: default_personalization(),
            saved_items: Vec::new(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Builds the profile row inserted when an identity first authenticates.
    ///
    /// The identity's email is matched case-insensitively against the
    /// administrator allow-list; a match yields `is_admin = true` and the
    /// Admin tier. The initial points grant applies regardless of tier.
    pub fn new_for_signup(
        user_id: &str,
        email: &str,
        admin_emails: &[String],
        initial_points: i64,
    ) -> Self {
        let is_admin = admin_emails
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(email));
        Self {
            user_id: user_id.to_string(),
            tier: if is_admin { Tier::Admin } else { Tier::Free },
            points: initial_points,
            is_admin,
            personalization: default_personalization(),
            saved_items: Vec::new(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Fills missing required personalization keys with their defaults.
    ///
    /// Existing keys are never overwritten. Returns `true` if any key was
    /// added, so callers know whether a repair write-back is worthwhile.
    pub fn backfill_personalization(&mut self) -> bool {
        let mut changed = false;
        for (key, default) in REQUIRED_PERSONALIZATION {
            if !self.personalization.contains_key(key) {
                self.personalization
                    .insert(key.to_string(), default.to_string());
                changed = true;
            }
        }
        changed
    }

    /// Whether a debit of `amount` is covered. Admins are always covered.
    pub fn covers(&self, amount: i64) -> bool {
        self.is_admin || amount <= self.points
    }
}
