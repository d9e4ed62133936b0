//! Top-N ranking derived from progression snapshots.
//!
//! The board lives in its own table and only changes through [`update`], which
//! runs inside the caller's transaction. Ordering is points descending with
//! ties broken by ascending user id.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum number of ranked users.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub points: i64,
    pub level: i64,
}

/// Replace the user's snapshot with their current points and level, then trim
/// the board back to [`LEADERBOARD_SIZE`]. Unknown users are simply removed.
pub fn update(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<()> {
    conn.execute("DELETE FROM leaderboard WHERE user_id = ?1", params![user_id])?;

    conn.execute(
        "INSERT INTO leaderboard (user_id, points, level, updated_at) \
         SELECT id, points, level, ?2 FROM users WHERE id = ?1",
        params![user_id, now],
    )?;

    conn.execute(
        "DELETE FROM leaderboard WHERE user_id NOT IN ( \
             SELECT user_id FROM leaderboard ORDER BY points DESC, user_id ASC LIMIT ?1 \
         )",
        params![LEADERBOARD_SIZE as i64],
    )?;

    tracing::debug!(user_id = %user_id, "leaderboard updated");
    Ok(())
}

/// Current top entries. Read-only.
pub fn read(conn: &Connection) -> Result<Vec<LeaderboardEntry>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, points, level FROM leaderboard \
         ORDER BY points DESC, user_id ASC LIMIT ?1",
    )?;
    let entries = stmt
        .query_map(params![LEADERBOARD_SIZE as i64], |row| {
            Ok(LeaderboardEntry {
                user_id: row.get(0)?,
                points: row.get(1)?,
                level: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Overwrite the board with the given entries (snapshot import).
pub(crate) fn replace_all(
    conn: &Connection,
    entries: &[LeaderboardEntry],
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute("DELETE FROM leaderboard", [])?;
    for entry in entries.iter().take(LEADERBOARD_SIZE) {
        conn.execute(
            "INSERT OR REPLACE INTO leaderboard (user_id, points, level, updated_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.user_id, entry.points, entry.level, now],
        )?;
    }
    Ok(())
}
