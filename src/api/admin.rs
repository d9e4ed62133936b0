use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState};
use crate::progression::User;

#[derive(Debug, Deserialize)]
pub struct AddPointsRequest {
    pub user_id: String,
    pub amount: i64,
    pub secret: String,
}

/// POST /api/admin/points
pub async fn add_points(
    State(kindred): State<AppState>,
    payload: Result<Json<AddPointsRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(req) = payload?;
    Ok(Json(kindred.admin_add_points(&req.user_id, req.amount, &req.secret).await?))
}
