//! Conversation memory type definitions.
//!
//! Defines [`MemoryEntry`] (one stored turn), [`Freshness`] (the decay class
//! of a turn at a given moment), [`ContextTurn`] (a turn as it appears in the
//! context window) and [`DecayPolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat turn, matching the `memories` table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    pub user_id: String,
    pub user_text: String,
    pub bot_text: String,
    pub created_at: DateTime<Utc>,
}

/// How a turn is treated when building the context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Recent enough to be passed through verbatim.
    Fresh,
    /// Still included, with the user text marked by its age.
    Faded,
    /// Excluded from the window. The row itself is kept.
    Forgotten,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Faded => "faded",
            Self::Forgotten => "forgotten",
        }
    }
}

impl std::fmt::Display for Freshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A turn prepared for the completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextTurn {
    /// User text, prefixed with an age marker when faded.
    pub user_text: String,
    pub bot_text: String,
    pub age_days: i64,
    pub freshness: Freshness,
}

/// Age boundaries, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayPolicy {
    /// Turns at least this old are faded.
    pub fade_after_days: i64,
    /// Turns at least this old are forgotten.
    pub forget_after_days: i64,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            fade_after_days: 3,
            forget_after_days: 7,
        }
    }
}

impl From<&crate::config::MemoryConfig> for DecayPolicy {
    fn from(config: &crate::config::MemoryConfig) -> Self {
        Self {
            fade_after_days: config.fade_after_days,
            forget_after_days: config.forget_after_days,
        }
    }
}
