//! Write and read paths for the conversation log.
//!
//! [`append`] is the only mutator. Rows are never deleted; decay only decides
//! which rows reach the context window.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::{KindredError, Result};
use crate::memory::types::MemoryEntry;

/// Words that mark a turn as asking for emotional support.
pub const SUPPORT_KEYWORDS: &[&str] = &[
    "sad",
    "lonely",
    "anxious",
    "anxiety",
    "stressed",
    "stress",
    "depressed",
    "worried",
    "scared",
    "afraid",
    "overwhelmed",
    "hurt",
    "cry",
    "help",
    "support",
];

/// Record a completed turn.
pub fn append(
    conn: &Connection,
    user_id: &str,
    user_text: &str,
    bot_text: &str,
    now: DateTime<Utc>,
) -> Result<MemoryEntry> {
    if user_id.trim().is_empty() {
        return Err(KindredError::validation("user id must not be empty"));
    }

    let entry = MemoryEntry {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        user_text: user_text.to_string(),
        bot_text: bot_text.to_string(),
        created_at: now,
    };

    insert_entry(conn, &entry)?;
    tracing::debug!(user_id = %user_id, id = %entry.id, "turn appended");
    Ok(entry)
}

/// Insert a fully formed entry (also used by snapshot import).
pub(crate) fn insert_entry(conn: &Connection, entry: &MemoryEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO memories (id, user_id, user_text, bot_text, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.id,
            entry.user_id,
            entry.user_text,
            entry.bot_text,
            entry.created_at,
        ],
    )?;
    Ok(())
}

/// The `limit` most recent turns for a user, oldest first.
pub fn recent_entries(conn: &Connection, user_id: &str, limit: u32) -> Result<Vec<MemoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, user_text, bot_text, created_at FROM memories \
         WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let mut entries = stmt
        .query_map(params![user_id, limit], map_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    entries.reverse();
    Ok(entries)
}

/// Every stored turn, oldest first.
pub fn all_entries(conn: &Connection) -> Result<Vec<MemoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, user_text, bot_text, created_at FROM memories \
         ORDER BY created_at, id",
    )?;
    let entries = stmt
        .query_map([], map_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn map_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemoryEntry> {
    Ok(MemoryEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_text: row.get(2)?,
        bot_text: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Total turns a user has ever recorded.
pub fn turn_count(conn: &Connection, user_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM memories WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Turns whose user text contains at least one support keyword.
pub fn support_turn_count(conn: &Connection, user_id: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT user_text FROM memories WHERE user_id = ?1")?;
    let mut rows = stmt.query(params![user_id])?;

    let mut count = 0;
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        if is_support_message(&text) {
            count += 1;
        }
    }
    Ok(count)
}

/// Whole-word, case-insensitive match against [`SUPPORT_KEYWORDS`].
pub fn is_support_message(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| {
            let word = word.to_lowercase();
            SUPPORT_KEYWORDS.contains(&word.as_str())
        })
}
