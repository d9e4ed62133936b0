//! Progression record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A user's gamified state, matching the `users` table plus its inventory and
/// badge rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Spendable balance. Never negative.
    pub points: i64,
    /// Starts at 1.
    pub level: i64,
    /// Progress inside the current level, always below `xp_threshold(level)`.
    pub xp: i64,
    /// Consecutive UTC days with at least one recorded activity.
    pub streak: i64,
    pub last_activity_at: Option<DateTime<Utc>>,
    /// How many recent turns the context window may draw from.
    pub memory_window: u32,
    #[serde(default)]
    pub inventory: BTreeSet<String>,
    #[serde(default)]
    pub badges: BTreeSet<String>,
}

impl User {
    /// Zero-default user as created lazily on first activity.
    pub fn new(id: impl Into<String>, memory_window: u32) -> Self {
        Self {
            id: id.into(),
            points: 0,
            level: 1,
            xp: 0,
            streak: 0,
            last_activity_at: None,
            memory_window,
            inventory: BTreeSet::new(),
            badges: BTreeSet::new(),
        }
    }
}

/// The user view returned by `getProfile`.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    /// XP still needed to reach the next level.
    pub xp_to_next_level: i64,
    /// Total recorded chat turns.
    pub turn_count: i64,
}

/// What a single `record_activity` call changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityOutcome {
    pub user_id: String,
    /// `base_points × multiplier`, added to both points and xp.
    pub award: i64,
    pub multiplier: i64,
    pub streak: i64,
    pub level: i64,
    pub levels_gained: i64,
    /// Flat points granted for the level-ups in this call.
    pub level_bonus: i64,
    pub points: i64,
    /// Badges issued by this call only.
    pub new_badges: Vec<String>,
}
