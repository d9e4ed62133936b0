//! Purchase transactions against the progression ledger.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::catalog::find_item;
use super::PurchaseOutcome;
use crate::error::{KindredError, Result};
use crate::progression::ledger::{load_user, validate_user_id};

/// Buy an item.
///
/// Order of checks: unknown item → `NotFound`; already owned → success with no
/// charge; balance below cost → `InsufficientFunds`. Otherwise the deduction,
/// the inventory row and any item effect commit together in one transaction.
pub fn purchase(
    conn: &mut Connection,
    user_id: &str,
    item_id: &str,
    now: DateTime<Utc>,
) -> Result<PurchaseOutcome> {
    validate_user_id(user_id)?;

    let tx = conn.transaction()?;

    let item = find_item(&tx, item_id)?
        .ok_or_else(|| KindredError::not_found(format!("shop item {item_id}")))?;

    // Users who have never been active hold nothing and have no points.
    let Some(user) = load_user(&tx, user_id)? else {
        return Err(KindredError::InsufficientFunds {
            needed: item.cost,
            available: 0,
        });
    };

    if user.inventory.contains(&item.id) {
        tracing::info!(user_id = %user_id, item_id = %item.id, "item already owned, nothing charged");
        return Ok(PurchaseOutcome {
            item,
            charged: 0,
            points: user.points,
            already_owned: true,
        });
    }

    if user.points < item.cost {
        return Err(KindredError::InsufficientFunds {
            needed: item.cost,
            available: user.points,
        });
    }

    let points = user.points - item.cost;
    tx.execute(
        "UPDATE users SET points = ?1 WHERE id = ?2",
        params![points, user_id],
    )?;
    tx.execute(
        "INSERT INTO user_inventory (user_id, item_id, acquired_at) VALUES (?1, ?2, ?3)",
        params![user_id, item.id, now],
    )?;
    if let Some(window) = item.memory_window {
        tx.execute(
            "UPDATE users SET memory_window = MAX(memory_window, ?1) WHERE id = ?2",
            params![window, user_id],
        )?;
    }
    crate::leaderboard::update(&tx, user_id, now)?;

    tx.commit()?;

    tracing::info!(
        user_id = %user_id,
        item_id = %item.id,
        cost = item.cost,
        points,
        "item purchased"
    );

    Ok(PurchaseOutcome {
        charged: item.cost,
        item,
        points,
        already_owned: false,
    })
}
