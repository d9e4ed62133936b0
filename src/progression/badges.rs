//! Badge issuance. Every badge is granted at most once per user; the
//! `(user_id, name)` primary key makes repeated grants no-ops.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::memory::store::{support_turn_count, turn_count};

pub const MARATHON_TALKER: &str = "Marathon Talker";
pub const EMPATHY_EXPERT: &str = "Empathy Expert";

/// Total turns needed for [`MARATHON_TALKER`].
pub const MARATHON_TURNS: i64 = 50;
/// Support-keyword turns needed for [`EMPATHY_EXPERT`].
pub const EMPATHY_TURNS: i64 = 10;

/// Badge name issued when a user reaches `level`.
pub fn level_badge(level: i64) -> String {
    format!("Level {level} Reached")
}

/// Grant a badge. Returns `true` only if the user did not already hold it.
pub fn grant_badge(
    conn: &Connection,
    user_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_badges (user_id, name, awarded_at) VALUES (?1, ?2, ?3)",
        params![user_id, name, now],
    )?;
    if inserted > 0 {
        tracing::info!(user_id = %user_id, badge = %name, "badge issued");
    }
    Ok(inserted > 0)
}

/// Check the conversation milestones and grant whatever has newly been earned.
pub fn check_milestones(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<String>> {
    let mut issued = Vec::new();

    if turn_count(conn, user_id)? >= MARATHON_TURNS
        && grant_badge(conn, user_id, MARATHON_TALKER, now)?
    {
        issued.push(MARATHON_TALKER.to_string());
    }

    if support_turn_count(conn, user_id)? >= EMPATHY_TURNS
        && grant_badge(conn, user_id, EMPATHY_EXPERT, now)?
    {
        issued.push(EMPATHY_EXPERT.to_string());
    }

    Ok(issued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::append;
    use chrono::TimeZone;

    fn setup() -> Connection {
        let conn = crate::db::open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO users (id, created_at) VALUES ('bob', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn grant_is_idempotent() {
        let conn = setup();
        assert!(grant_badge(&conn, "bob", "Level 2 Reached", now()).unwrap());
        assert!(!grant_badge(&conn, "bob", "Level 2 Reached", now()).unwrap());
    }

    #[test]
    fn marathon_needs_fifty_turns() {
        let conn = setup();
        for i in 0..49 {
            append(&conn, "bob", &format!("turn {i}"), "ok", now()).unwrap();
        }
        assert!(check_milestones(&conn, "bob", now()).unwrap().is_empty());

        append(&conn, "bob", "turn 49", "ok", now()).unwrap();
        assert_eq!(check_milestones(&conn, "bob", now()).unwrap(), vec![MARATHON_TALKER]);
        // second check issues nothing new
        assert!(check_milestones(&conn, "bob", now()).unwrap().is_empty());
    }

    #[test]
    fn empathy_counts_only_support_turns() {
        let conn = setup();
        for _ in 0..9 {
            append(&conn, "bob", "I feel so lonely tonight", "I'm here", now()).unwrap();
        }
        append(&conn, "bob", "what's the weather", "sunny", now()).unwrap();
        assert!(check_milestones(&conn, "bob", now()).unwrap().is_empty());

        append(&conn, "bob", "Work has me STRESSED", "breathe", now()).unwrap();
        assert_eq!(check_milestones(&conn, "bob", now()).unwrap(), vec![EMPATHY_EXPERT]);
    }
}
