//! CLI `reset` command: delete all user state after confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use crate::config::KindredConfig;
use crate::db::snapshot::{self, Document};

/// Wipe users, memories, moods and daily state. The shop catalog survives.
pub fn reset(config: &KindredConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL users, conversations, moods and daily state.");
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let mut conn = crate::db::open_database(&db_path)?;
    snapshot::import_document(&mut conn, &Document::default(), chrono::Utc::now())?;

    println!("All user state deleted. Database reset complete.");
    Ok(())
}
