//! Store-wide counts for the `stats` command.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub users: u64,
    pub total_points: i64,
    pub memories: u64,
    pub moods: u64,
    pub badges_awarded: u64,
    pub items_owned: u64,
    pub oracle_days: u64,
    pub questions_answered: u64,
    pub questions_pending: u64,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<DateTime<Utc>>,
}

/// Compute store statistics. `db_path` is only used for the file size; pass
/// `None` for in-memory databases.
pub fn store_stats(conn: &Connection, db_path: Option<&Path>) -> Result<StoreStats> {
    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    let (oldest_memory, newest_memory): (Option<DateTime<Utc>>, Option<DateTime<Utc>>) = conn.query_row(
        "SELECT MIN(created_at), MAX(created_at) FROM memories",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(StoreStats {
        users: count(conn, "SELECT COUNT(*) FROM users")?,
        total_points: conn.query_row("SELECT COALESCE(SUM(points), 0) FROM users", [], |row| row.get(0))?,
        memories: count(conn, "SELECT COUNT(*) FROM memories")?,
        moods: count(conn, "SELECT COUNT(*) FROM moods")?,
        badges_awarded: count(conn, "SELECT COUNT(*) FROM user_badges")?,
        items_owned: count(conn, "SELECT COUNT(*) FROM user_inventory")?,
        oracle_days: count(conn, "SELECT COUNT(*) FROM daily_oracle")?,
        questions_answered: count(conn, "SELECT COUNT(*) FROM daily_questions WHERE answered = 1")?,
        questions_pending: count(conn, "SELECT COUNT(*) FROM daily_questions WHERE answered = 0")?,
        db_size_bytes,
        oldest_memory,
        newest_memory,
    })
}

fn count(conn: &Connection, sql: &str) -> Result<u64> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as u64)
}
