//! The global once-per-UTC-day oracle message.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};

/// Day payloads used when the content provider is unavailable.
pub const FALLBACK_ORACLES: &[&str] = &[
    "Small steps still move you forward. Take one today.",
    "Someone is glad you exist, even if they have not said it lately.",
    "Rest is part of the work, not a break from it.",
    "The kindness you give yourself today echoes into tomorrow.",
    "You do not need to have it all figured out to begin.",
    "Notice one good thing before the day ends.",
    "Courage can be quiet. Asking for help counts.",
];

/// Shown to callers once today's oracle has already been revealed.
pub const PLACEHOLDERS: &[&str] = &[
    "The oracle has already spoken today. Come back tomorrow for a new message.",
    "Today's message is written. Sit with it a while.",
    "The stars are resting. A fresh reading arrives at midnight UTC.",
    "One message per day keeps its meaning. See you tomorrow.",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleReading {
    pub day: NaiveDate,
    pub payload: String,
    /// `true` if the day's oracle existed before this request.
    pub already_consumed: bool,
}

/// The UTC calendar day used as the oracle key.
pub fn utc_day(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// Today's stored payload, if any.
pub fn find(conn: &Connection, day: NaiveDate) -> Result<Option<String>> {
    let payload = conn
        .query_row(
            "SELECT payload FROM daily_oracle WHERE day = ?1",
            params![day],
            |row| row.get(0),
        )
        .optional()?;
    Ok(payload)
}

/// Persist `payload` as the day's oracle unless one is already stored, and
/// return whichever payload won. Once written, a day's row never changes.
pub fn insert_if_absent(
    conn: &Connection,
    day: NaiveDate,
    payload: &str,
    now: DateTime<Utc>,
) -> Result<OracleReading> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO daily_oracle (day, payload, created_at) VALUES (?1, ?2, ?3)",
        params![day, payload, now],
    )?;

    let stored = find(conn, day)?
        .ok_or_else(|| KindredError::Internal(format!("oracle for {day} missing after insert")))?;

    if inserted > 0 {
        tracing::info!(day = %day, "daily oracle created");
    }

    Ok(OracleReading {
        day,
        payload: stored,
        already_consumed: inserted == 0,
    })
}

/// Every stored oracle, oldest first.
pub fn all(conn: &Connection) -> Result<Vec<(NaiveDate, String)>> {
    let mut stmt = conn.prepare("SELECT day, payload FROM daily_oracle ORDER BY day")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Deterministic fallback payload for a day.
pub fn fallback_oracle(day: NaiveDate) -> &'static str {
    let index = day.num_days_from_ce().unsigned_abs() as usize % FALLBACK_ORACLES.len();
    FALLBACK_ORACLES[index]
}

/// Rotating "already consumed" message.
pub fn placeholder(turn: usize) -> &'static str {
    PLACEHOLDERS[turn % PLACEHOLDERS.len()]
}

/// Strip whitespace and wrapping quotes a provider may add around the message.
pub fn clean_payload(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_matches('"').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn first_insert_wins() {
        let conn = crate::db::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();
        let day = utc_day(now);

        let first = insert_if_absent(&conn, day, "alpha", now).unwrap();
        assert!(!first.already_consumed);

        let second = insert_if_absent(&conn, day, "beta", now).unwrap();
        assert!(second.already_consumed);
        assert_eq!(second.payload, "alpha");
    }

    #[test]
    fn fallback_is_stable_for_a_day() {
        let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert_eq!(fallback_oracle(day), fallback_oracle(day));
    }

    #[test]
    fn clean_payload_rejects_blank() {
        assert_eq!(clean_payload("  \"Be gentle.\" \n"), Some("Be gentle.".to_string()));
        assert_eq!(clean_payload(" \"\" "), None);
    }
}
