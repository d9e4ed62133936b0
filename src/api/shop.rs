use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState};
use crate::economy::{PurchaseOutcome, ShopItem};

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: String,
    pub item_id: String,
}

/// GET /api/shop
pub async fn list(State(kindred): State<AppState>) -> ApiResult<Vec<ShopItem>> {
    Ok(Json(kindred.list_shop().await?))
}

/// GET /api/shop/{item_id}
pub async fn preview(State(kindred): State<AppState>, Path(item_id): Path<String>) -> ApiResult<ShopItem> {
    Ok(Json(kindred.preview_item(&item_id).await?))
}

/// POST /api/shop/purchase
pub async fn purchase(
    State(kindred): State<AppState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> ApiResult<PurchaseOutcome> {
    let Json(req) = payload?;
    tracing::info!(user_id = %req.user_id, item_id = %req.item_id, "purchase requested");
    Ok(Json(kindred.purchase(&req.user_id, &req.item_id).await?))
}
