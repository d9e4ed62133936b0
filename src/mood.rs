//! Mood journal with localized heartbeat replies.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};
use crate::progression::ledger::validate_user_id;

pub const MAX_MOOD_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub user_id: String,
    pub mood: String,
    pub locale: String,
    pub created_at: DateTime<Utc>,
}

/// Store a mood and return the entry.
pub fn record_mood(
    conn: &Connection,
    user_id: &str,
    mood: &str,
    locale: &str,
    now: DateTime<Utc>,
) -> Result<MoodEntry> {
    validate_user_id(user_id)?;
    let mood = mood.trim();
    if mood.is_empty() {
        return Err(KindredError::validation("mood must not be empty"));
    }
    if mood.chars().count() > MAX_MOOD_LEN {
        return Err(KindredError::validation(format!(
            "mood must be at most {MAX_MOOD_LEN} characters"
        )));
    }

    let entry = MoodEntry {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        mood: mood.to_string(),
        locale: normalize_locale(locale).to_string(),
        created_at: now,
    };
    insert_mood(conn, &entry)?;

    tracing::info!(user_id = %user_id, mood = %entry.mood, "mood recorded");
    Ok(entry)
}

pub(crate) fn insert_mood(conn: &Connection, entry: &MoodEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO moods (id, user_id, mood, locale, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![entry.id, entry.user_id, entry.mood, entry.locale, entry.created_at],
    )?;
    Ok(())
}

/// A user's moods, newest first.
pub fn list_moods(conn: &Connection, user_id: &str) -> Result<Vec<MoodEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, mood, locale, created_at FROM moods \
         WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let entries = stmt
        .query_map(params![user_id], map_mood)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Every mood for every user, oldest first.
pub fn all_moods(conn: &Connection) -> Result<Vec<MoodEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, mood, locale, created_at FROM moods ORDER BY created_at, id",
    )?;
    let entries = stmt
        .query_map([], map_mood)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn map_mood(row: &rusqlite::Row<'_>) -> rusqlite::Result<MoodEntry> {
    Ok(MoodEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        mood: row.get(2)?,
        locale: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Two-letter language code, `en` when unknown.
pub fn normalize_locale(locale: &str) -> &'static str {
    let lang = locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match lang.as_str() {
        "es" => "es",
        "fr" => "fr",
        "de" => "de",
        _ => "en",
    }
}

/// The short acknowledgement returned after a mood is recorded.
pub fn heartbeat_message(mood: &str, locale: &str) -> String {
    match normalize_locale(locale) {
        "es" => format!("Gracias por contarme que te sientes {mood}. Estoy aquí contigo."),
        "fr" => format!("Merci de me dire que tu te sens {mood}. Je suis là avec toi."),
        "de" => format!("Danke, dass du mir sagst, dass du dich {mood} fühlst. Ich bin für dich da."),
        _ => format!("Thanks for telling me you feel {mood}. I'm right here with you."),
    }
}
