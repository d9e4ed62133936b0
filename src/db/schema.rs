//! SQL DDL for all Kindred tables.
//!
//! Each component owns its slice of state: `users`, `user_inventory` and
//! `user_badges` (progression), `memories` and `moods` (conversation log),
//! `leaderboard`, `shop_items` (economy), `daily_oracle` and
//! `daily_questions` (daily gate), and `schema_meta`. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    points INTEGER NOT NULL DEFAULT 0 CHECK(points >= 0),
    level INTEGER NOT NULL DEFAULT 1 CHECK(level >= 1),
    xp INTEGER NOT NULL DEFAULT 0 CHECK(xp >= 0),
    streak INTEGER NOT NULL DEFAULT 0 CHECK(streak >= 0),
    last_activity_at TEXT,
    memory_window INTEGER NOT NULL DEFAULT 30 CHECK(memory_window > 0),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_inventory (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    item_id TEXT NOT NULL,
    acquired_at TEXT NOT NULL,
    PRIMARY KEY (user_id, item_id)
);

CREATE TABLE IF NOT EXISTS user_badges (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    awarded_at TEXT NOT NULL,
    PRIMARY KEY (user_id, name)
);

-- Append-only conversation log; decay only hides rows from the context window
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    user_text TEXT NOT NULL,
    bot_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_memories_user_time ON memories(user_id, created_at);

CREATE TABLE IF NOT EXISTS moods (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    mood TEXT NOT NULL,
    locale TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_moods_user_time ON moods(user_id, created_at);

CREATE TABLE IF NOT EXISTS leaderboard (
    user_id TEXT PRIMARY KEY,
    points INTEGER NOT NULL,
    level INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shop_items (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    cost INTEGER NOT NULL CHECK(cost > 0),
    description TEXT NOT NULL,
    memory_window INTEGER
);

CREATE TABLE IF NOT EXISTS daily_oracle (
    day TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_questions (
    user_id TEXT PRIMARY KEY,
    question TEXT NOT NULL,
    choices TEXT NOT NULL,
    answer_index INTEGER NOT NULL,
    reward INTEGER NOT NULL,
    answered INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    answered_at TEXT
);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
