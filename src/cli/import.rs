use anyhow::{Context, Result};
use std::path::Path;

use crate::config::KindredConfig;
use crate::db::snapshot::{self, Document};

/// Replace the store's contents with a previously exported document.
///
/// By default a malformed file is an error: an operator import must never
/// silently wipe the store. With `lenient`, the file goes through the
/// snapshot reader instead, so an unreadable or corrupt file reads as empty
/// and the import becomes a no-op.
pub fn import(config: &KindredConfig, file: &Path, lenient: bool) -> Result<()> {
    let Some(doc) = load_document(file, lenient)? else {
        println!("Nothing readable in {}, store left unchanged.", file.display());
        return Ok(());
    };

    let db_path = config.resolved_db_path();
    let mut conn = crate::db::open_database(&db_path)?;

    println!(
        "Importing {} users, {} memories and {} moods...",
        doc.users.len(),
        doc.memories.len(),
        doc.moods.len()
    );

    snapshot::import_document(&mut conn, &doc, chrono::Utc::now())
        .context("import rejected, store left unchanged")?;

    println!("Import complete.");
    Ok(())
}

/// `None` when a lenient read found nothing to import.
fn load_document(file: &Path, lenient: bool) -> Result<Option<Document>> {
    if lenient {
        let doc = snapshot::read_document(file);
        return Ok((!doc.is_empty()).then_some(doc));
    }

    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;
    let doc: Document = serde_json::from_str(&json).context("failed to parse import JSON")?;
    Ok(Some(doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_file_fails_strict_and_skips_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, "{ truncated").unwrap();

        assert!(load_document(&path, false).is_err());
        assert!(load_document(&path, true).unwrap().is_none());
        assert!(load_document(&dir.path().join("missing.json"), true).unwrap().is_none());
    }

    #[test]
    fn lenient_read_keeps_a_valid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        let doc = Document {
            version: snapshot::DOCUMENT_VERSION,
            users: vec![crate::progression::User::new("rae", 30)],
            ..Document::default()
        };
        snapshot::write_document(&path, &doc).unwrap();

        assert_eq!(load_document(&path, true).unwrap(), Some(doc.clone()));
        assert_eq!(load_document(&path, false).unwrap(), Some(doc));
    }
}
