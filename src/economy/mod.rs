//! Shop catalog and purchases.

pub mod catalog;
pub mod purchase;

use serde::{Deserialize, Serialize};

pub use catalog::{list_items, preview};
pub use purchase::purchase;

/// A catalog entry, matching the `shop_items` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    /// Always positive.
    pub cost: i64,
    pub description: String,
    /// Context window size granted on purchase, if the item is an upgrade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_window: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub item: ShopItem,
    /// Points deducted by this call; 0 when the item was already owned.
    pub charged: i64,
    /// Balance after the purchase.
    pub points: i64,
    pub already_owned: bool,
}
