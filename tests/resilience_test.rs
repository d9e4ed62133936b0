use kindred::db;
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();
    assert!(db_path.exists());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("test.db")).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}

#[test]
fn corrupt_file_is_quarantined_and_replaced() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("kindred.db");
    std::fs::write(&db_path, vec![b'x'; 4096]).unwrap();

    let conn = db::open_database(&db_path).unwrap();
    let items: i64 = conn
        .query_row("SELECT COUNT(*) FROM shop_items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(items, 4);

    let quarantined = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("kindred.db.corrupt-"));
    assert!(quarantined);
}

#[test]
fn state_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("kindred.db");
    let now = chrono::Utc::now();

    {
        let mut conn = db::open_database(&db_path).unwrap();
        kindred::progression::record_activity(&mut conn, "vic", 25, now, 30).unwrap();
    }

    let conn = db::open_database(&db_path).unwrap();
    let user = kindred::progression::ledger::load_user(&conn, "vic").unwrap().unwrap();
    assert_eq!(user.points, 25);
}
