//! The fixed shop catalog.

use rusqlite::{params, Connection, OptionalExtension};

use super::ShopItem;
use crate::error::{KindredError, Result};

/// Seed rows: (id, name, cost, description, memory_window effect).
pub const SEED_ITEMS: &[(&str, &str, i64, &str, Option<u32>)] = &[
    (
        "golden_frame",
        "Golden Frame",
        50,
        "A warm golden border around your profile card.",
        None,
    ),
    (
        "night_theme",
        "Night Theme",
        100,
        "A calm dark palette for late conversations.",
        None,
    ),
    (
        "oracle_candle",
        "Oracle Candle",
        150,
        "A candle that flickers beside the daily oracle.",
        None,
    ),
    (
        "memory_boost",
        "Memory Boost",
        200,
        "Your companion remembers your last 60 turns instead of 30.",
        Some(60),
    ),
];

/// Insert the seed catalog. Existing rows are left untouched.
pub fn seed_catalog(conn: &Connection) -> rusqlite::Result<()> {
    for (id, name, cost, description, memory_window) in SEED_ITEMS {
        conn.execute(
            "INSERT OR IGNORE INTO shop_items (id, name, cost, description, memory_window) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, cost, description, memory_window],
        )?;
    }
    Ok(())
}

/// All items, cheapest first.
pub fn list_items(conn: &Connection) -> Result<Vec<ShopItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, cost, description, memory_window FROM shop_items ORDER BY cost, id",
    )?;
    let items = stmt
        .query_map([], map_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

/// Read-only catalog lookup.
pub fn preview(conn: &Connection, item_id: &str) -> Result<ShopItem> {
    find_item(conn, item_id)?.ok_or_else(|| KindredError::not_found(format!("shop item {item_id}")))
}

pub(crate) fn find_item(conn: &Connection, item_id: &str) -> Result<Option<ShopItem>> {
    let item = conn
        .query_row(
            "SELECT id, name, cost, description, memory_window FROM shop_items WHERE id = ?1",
            params![item_id],
            map_item,
        )
        .optional()?;
    Ok(item)
}

fn map_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShopItem> {
    Ok(ShopItem {
        id: row.get(0)?,
        name: row.get(1)?,
        cost: row.get(2)?,
        description: row.get(3)?,
        memory_window: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_by_cost() {
        let conn = crate::db::open_in_memory().unwrap();
        let costs: Vec<i64> = list_items(&conn).unwrap().iter().map(|i| i.cost).collect();
        assert_eq!(costs, vec![50, 100, 150, 200]);
    }

    #[test]
    fn preview_unknown_item_is_not_found() {
        let conn = crate::db::open_in_memory().unwrap();
        assert!(matches!(
            preview(&conn, "unicorn"),
            Err(KindredError::NotFound(_))
        ));
        assert_eq!(preview(&conn, "memory_boost").unwrap().memory_window, Some(60));
    }
}
