//! Points, XP, level and streak state machine.
//!
//! [`record_activity`] is the single entry point for earned progress. It runs
//! inside one transaction: streak update → multiplied award → level-up loop →
//! badge checks. [`apply_activity`] is the same pipeline for callers that
//! already hold a transaction (the chat turn and daily answer flows).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;

use super::badges::{check_milestones, grant_badge, level_badge};
use super::types::{ActivityOutcome, Profile, User};
use crate::error::{KindredError, Result};

/// XP per level step: reaching level `n + 1` costs `n × 500` XP.
pub const LEVEL_XP_STEP: i64 = 500;
/// Flat points granted on every level-up, on top of the award.
pub const LEVEL_UP_BONUS: i64 = 50;

/// XP needed to leave `level`.
pub fn xp_threshold(level: i64) -> i64 {
    level.max(1) * LEVEL_XP_STEP
}

/// Award multiplier for a streak length.
///
/// The two factors compound: ×2 from day 3, then a further ×5 from day 7,
/// giving 1, 2 and 10.
pub fn streak_multiplier(streak: i64) -> i64 {
    let mut multiplier = 1;
    if streak >= 3 {
        multiplier *= 2;
    }
    if streak >= 7 {
        multiplier *= 5;
    }
    multiplier
}

/// Streak after an activity at `now`, comparing UTC calendar days.
pub fn next_streak(streak: i64, last_activity_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(last) = last_activity_at else {
        return 1;
    };

    let gap = (now.date_naive() - last.date_naive()).num_days();
    match gap {
        1 => streak + 1,
        // lapsed: the old streak is gone and this activity starts a new one
        g if g > 1 => 1,
        // same day (or a clock that stepped backwards)
        _ => streak.max(1),
    }
}

/// Load a user with inventory and badges, or `None` if they have never been active.
pub fn load_user(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT id, points, level, xp, streak, last_activity_at, memory_window \
             FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    points: row.get(1)?,
                    level: row.get(2)?,
                    xp: row.get(3)?,
                    streak: row.get(4)?,
                    last_activity_at: row.get(5)?,
                    memory_window: row.get(6)?,
                    inventory: BTreeSet::new(),
                    badges: BTreeSet::new(),
                })
            },
        )
        .optional()?;

    let Some(mut user) = row else {
        return Ok(None);
    };

    user.inventory = read_names(
        conn,
        "SELECT item_id FROM user_inventory WHERE user_id = ?1",
        user_id,
    )?;
    user.badges = read_names(
        conn,
        "SELECT name FROM user_badges WHERE user_id = ?1",
        user_id,
    )?;

    Ok(Some(user))
}

fn read_names(conn: &Connection, sql: &str, user_id: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(sql)?;
    let names = stmt
        .query_map(params![user_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    Ok(names)
}

/// Load a user, creating the zero-default record on first contact.
pub fn ensure_user(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
    memory_window: u32,
) -> Result<User> {
    validate_user_id(user_id)?;

    let created = conn.execute(
        "INSERT OR IGNORE INTO users (id, points, level, xp, streak, memory_window, created_at) \
         VALUES (?1, 0, 1, 0, 0, ?2, ?3)",
        params![user_id, memory_window.max(1), now],
    )?;
    if created > 0 {
        tracing::info!(user_id = %user_id, "user created");
    }

    load_user(conn, user_id)?
        .ok_or_else(|| KindredError::Internal(format!("user {user_id} vanished after insert")))
}

/// The profile view. Unknown users get an unpersisted zero-default profile.
pub fn profile(conn: &Connection, user_id: &str, default_window: u32) -> Result<Profile> {
    validate_user_id(user_id)?;

    let user = load_user(conn, user_id)?.unwrap_or_else(|| User::new(user_id, default_window));
    let turn_count = crate::memory::store::turn_count(conn, user_id)?;

    Ok(Profile {
        xp_to_next_level: xp_threshold(user.level) - user.xp,
        turn_count,
        user,
    })
}

/// Record earned progress inside its own transaction and refresh the
/// leaderboard.
pub fn record_activity(
    conn: &mut Connection,
    user_id: &str,
    base_points: i64,
    now: DateTime<Utc>,
    default_window: u32,
) -> Result<ActivityOutcome> {
    let tx = conn.transaction()?;
    let outcome = apply_activity(&tx, user_id, base_points, now, default_window)?;
    crate::leaderboard::update(&tx, user_id, now)?;
    tx.commit()?;
    Ok(outcome)
}

/// Record earned progress on a connection the caller has already put in a
/// transaction. Validation happens before any write.
pub fn apply_activity(
    conn: &Connection,
    user_id: &str,
    base_points: i64,
    now: DateTime<Utc>,
    default_window: u32,
) -> Result<ActivityOutcome> {
    validate_user_id(user_id)?;
    if base_points < 0 {
        return Err(KindredError::validation(format!(
            "base points must be non-negative, got {base_points}"
        )));
    }

    let user = ensure_user(conn, user_id, now, default_window)?;

    // 1. Streak
    let streak = next_streak(user.streak, user.last_activity_at, now);

    // 2. Award
    let multiplier = streak_multiplier(streak);
    let award = base_points
        .checked_mul(multiplier)
        .ok_or_else(|| KindredError::validation("award overflows"))?;

    // 3. Points and XP
    let mut points = user.points.saturating_add(award);
    let mut xp = user.xp.saturating_add(award);
    let mut level = user.level;

    // 4. Level-up loop
    let mut new_badges = Vec::new();
    let mut level_bonus = 0;
    while xp >= xp_threshold(level) {
        xp -= xp_threshold(level);
        level += 1;
        level_bonus += LEVEL_UP_BONUS;

        let badge = level_badge(level);
        if grant_badge(conn, user_id, &badge, now)? {
            new_badges.push(badge);
        }
    }
    points = points.saturating_add(level_bonus);

    conn.execute(
        "UPDATE users SET points = ?1, xp = ?2, level = ?3, streak = ?4, last_activity_at = ?5 \
         WHERE id = ?6",
        params![points, xp, level, streak, now, user_id],
    )?;

    // 5. Milestone badges
    new_badges.extend(check_milestones(conn, user_id, now)?);

    tracing::info!(
        user_id = %user_id,
        award,
        multiplier,
        streak,
        level,
        points,
        "activity recorded"
    );

    Ok(ActivityOutcome {
        user_id: user_id.to_string(),
        award,
        multiplier,
        streak,
        level,
        levels_gained: level - user.level,
        level_bonus,
        points,
        new_badges,
    })
}

/// Admin grant: add points directly, bypassing streaks, XP and badges.
pub fn add_points(
    conn: &mut Connection,
    user_id: &str,
    amount: i64,
    now: DateTime<Utc>,
    default_window: u32,
) -> Result<User> {
    if amount < 0 {
        return Err(KindredError::validation(format!(
            "amount must be non-negative, got {amount}"
        )));
    }

    let tx = conn.transaction()?;
    let user = ensure_user(&tx, user_id, now, default_window)?;
    let points = user.points.saturating_add(amount);
    tx.execute(
        "UPDATE users SET points = ?1 WHERE id = ?2",
        params![points, user_id],
    )?;
    crate::leaderboard::update(&tx, user_id, now)?;
    tx.commit()?;

    tracing::info!(user_id = %user_id, amount, points, "admin points granted");
    Ok(User { points, ..user })
}

pub(crate) fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(KindredError::validation("user id must not be empty"));
    }
    if user_id.len() > 128 {
        return Err(KindredError::validation("user id must be at most 128 bytes"));
    }
    Ok(())
}
