pub mod migrations;
pub mod schema;
pub mod snapshot;
pub mod stats;

use anyhow::{Context, Result};
use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// The shared connection handle. Every read-modify-write sequence holds this
/// lock for the duration of one transaction, so writers never interleave.
pub type SharedDb = Arc<Mutex<Connection>>;

/// Open (or create) the Kindred database at the given path with schema and
/// migrations applied.
///
/// A file that SQLite refuses as a database is moved aside to
/// `<name>.corrupt-<unix-ts>` and replaced by an empty database. This is a
/// lossy recovery: the quarantined file is kept for manual inspection but
/// none of its state is carried over.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = match try_open(path) {
        Ok(conn) => conn,
        Err(err) if is_corruption(&err) => {
            let quarantined = quarantine(path)?;
            tracing::warn!(
                path = %path.display(),
                moved_to = %quarantined.display(),
                error = %err,
                "database unreadable, starting from an empty store"
            );
            try_open(path)
                .with_context(|| format!("failed to recreate database at {}", path.display()))?
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to open database at {}", path.display()))
        }
    };

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with schema and migrations applied.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Wrap a connection for sharing across request handlers.
pub fn shared(conn: Connection) -> SharedDb {
    Arc::new(Mutex::new(conn))
}

fn try_open(path: &Path) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    let check: String = conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
    if check != "ok" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CORRUPT),
            Some(check),
        ));
    }

    schema::init_schema(&conn)?;
    migrations::run_migrations(&mut conn)?;
    Ok(conn)
}

fn is_corruption(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::NotADatabase) | Some(ErrorCode::DatabaseCorrupt)
    )
}

/// Move a damaged database (and its WAL sidecars) out of the way.
fn quarantine(path: &Path) -> Result<PathBuf> {
    let stamp = chrono::Utc::now().timestamp();
    let mut target = path.as_os_str().to_owned();
    target.push(format!(".corrupt-{stamp}"));
    let target = PathBuf::from(target);

    std::fs::rename(path, &target)
        .with_context(|| format!("failed to quarantine {}", path.display()))?;

    for suffix in ["-wal", "-shm"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(sidecar));
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_database_is_fully_migrated() {
        let conn = open_in_memory().unwrap();
        assert_eq!(
            migrations::get_schema_version(&conn).unwrap(),
            migrations::CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn garbage_file_is_reported_as_corruption() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("junk.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        let err = try_open(&path).unwrap_err();
        assert!(is_corruption(&err), "unexpected error: {err}");
    }
}
