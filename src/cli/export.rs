use anyhow::Result;
use std::path::Path;

use crate::config::KindredConfig;
use crate::db::snapshot;

/// Export the whole store as a JSON document, to `out` or stdout.
pub fn export(config: &KindredConfig, out: Option<&Path>) -> Result<()> {
    let db_path = config.resolved_db_path();
    let mut conn = crate::db::open_database(&db_path)?;

    let doc = snapshot::export_document(&mut conn)?;

    match out {
        Some(path) => {
            snapshot::write_document(path, &doc)?;
            eprintln!("Snapshot written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&doc)?),
    }

    eprintln!(
        "Exported {} users, {} memories and {} moods.",
        doc.users.len(),
        doc.memories.len(),
        doc.moods.len()
    );

    Ok(())
}
