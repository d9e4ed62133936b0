//! Whole-store JSON snapshots.
//!
//! A [`Document`] holds every persisted record. Exports read it inside one
//! transaction so the snapshot is consistent; imports replace all user state
//! atomically (the shop catalog is left alone). Snapshot files are written via
//! a temporary sibling and a rename, so a crash never leaves a half-written
//! file behind. Reading a missing or unparseable file yields an empty
//! document rather than an error.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::daily::oracle;
use crate::daily::question::{self, DailyQuestion};
use crate::error::{KindredError, Result};
use crate::leaderboard::{self, LeaderboardEntry};
use crate::memory::store as memory_store;
use crate::memory::MemoryEntry;
use crate::mood::{self, MoodEntry};
use crate::progression::ledger::load_user;
use crate::progression::User;

/// Current snapshot format.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRecord {
    pub day: NaiveDate,
    pub payload: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub version: u32,
    pub users: Vec<User>,
    pub memories: Vec<MemoryEntry>,
    pub moods: Vec<MoodEntry>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub oracles: Vec<OracleRecord>,
    pub daily_questions: Vec<DailyQuestion>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.memories.is_empty()
            && self.moods.is_empty()
            && self.oracles.is_empty()
            && self.daily_questions.is_empty()
    }
}

/// Read a snapshot file. Absent or corrupt files produce the default
/// document; corruption is logged.
pub fn read_document(path: impl AsRef<Path>) -> Document {
    let path = path.as_ref();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Document::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot unreadable, using empty document");
            return Document::default();
        }
    };

    match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot corrupt, using empty document");
            Document::default()
        }
    }
}

/// Write a snapshot atomically: serialize to `<path>.tmp`, then rename over
/// the target.
pub fn write_document(path: impl AsRef<Path>, doc: &Document) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| KindredError::Storage(format!("failed to create {}: {e}", parent.display())))?;
    }

    let json = serde_json::to_string_pretty(doc)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, json)
        .map_err(|e| KindredError::Storage(format!("failed to write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| KindredError::Storage(format!("failed to replace {}: {e}", path.display())))?;

    tracing::debug!(path = %path.display(), "snapshot written");
    Ok(())
}

/// Collect the full store into a document.
pub fn export_document(conn: &mut Connection) -> Result<Document> {
    let tx = conn.transaction()?;

    let ids: Vec<String> = {
        let mut stmt = tx.prepare("SELECT id FROM users ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids
    };
    let mut users = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(user) = load_user(&tx, id)? {
            users.push(user);
        }
    }

    let doc = Document {
        version: DOCUMENT_VERSION,
        users,
        memories: memory_store::all_entries(&tx)?,
        moods: mood::all_moods(&tx)?,
        leaderboard: leaderboard::read(&tx)?,
        oracles: oracle::all(&tx)?
            .into_iter()
            .map(|(day, payload)| OracleRecord { day, payload })
            .collect(),
        daily_questions: question::all(&tx)?,
    };
    tx.commit()?;

    Ok(doc)
}

/// Replace all user state with the document's contents in one transaction.
/// Any invalid record (negative points, level 0, ...) aborts the whole import.
pub fn import_document(conn: &mut Connection, doc: &Document, now: DateTime<Utc>) -> Result<()> {
    if doc.version > DOCUMENT_VERSION {
        return Err(KindredError::validation(format!(
            "snapshot version {} is newer than supported version {DOCUMENT_VERSION}",
            doc.version
        )));
    }

    let tx = conn.transaction()?;

    for table in [
        "user_inventory",
        "user_badges",
        "memories",
        "moods",
        "leaderboard",
        "daily_oracle",
        "daily_questions",
        "users",
    ] {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
    }

    for user in &doc.users {
        insert_user(&tx, user, now)?;
    }
    for entry in &doc.memories {
        memory_store::insert_entry(&tx, entry)?;
    }
    for entry in &doc.moods {
        mood::insert_mood(&tx, entry)?;
    }
    for record in &doc.oracles {
        oracle::insert_if_absent(&tx, record.day, &record.payload, now)?;
    }
    for q in &doc.daily_questions {
        question::insert_question(&tx, q)?;
    }

    // derived, so rebuild it rather than trusting the document
    let mut ranked: Vec<LeaderboardEntry> = doc
        .users
        .iter()
        .map(|u| LeaderboardEntry {
            user_id: u.id.clone(),
            points: u.points,
            level: u.level,
        })
        .collect();
    ranked.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.user_id.cmp(&b.user_id)));
    leaderboard::replace_all(&tx, &ranked, now)?;

    tx.commit()?;

    tracing::info!(
        users = doc.users.len(),
        memories = doc.memories.len(),
        moods = doc.moods.len(),
        "snapshot imported"
    );
    Ok(())
}

fn insert_user(conn: &Connection, user: &User, now: DateTime<Utc>) -> Result<()> {
    crate::progression::ledger::validate_user_id(&user.id)?;
    conn.execute(
        "INSERT INTO users (id, points, level, xp, streak, last_activity_at, memory_window, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.points,
            user.level,
            user.xp,
            user.streak,
            user.last_activity_at,
            user.memory_window,
            now,
        ],
    )?;
    for item in &user.inventory {
        conn.execute(
            "INSERT INTO user_inventory (user_id, item_id, acquired_at) VALUES (?1, ?2, ?3)",
            params![user.id, item, now],
        )?;
    }
    for badge in &user.badges {
        conn.execute(
            "INSERT INTO user_badges (user_id, name, awarded_at) VALUES (?1, ?2, ?3)",
            params![user.id, badge, now],
        )?;
    }
    Ok(())
}
