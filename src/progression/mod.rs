//! Per-user progression: points, XP, levels, streaks and badges.

pub mod badges;
pub mod ledger;
pub mod types;

pub use ledger::{record_activity, streak_multiplier, xp_threshold};
pub use types::{ActivityOutcome, Profile, User};
