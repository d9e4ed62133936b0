use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiResult, AppState, DEFAULT_LOCALE};
use crate::mood::MoodEntry;

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub user_id: String,
    pub mood: String,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoodResponse {
    pub heartbeat_message: String,
}

/// POST /api/mood
pub async fn record(
    State(kindred): State<AppState>,
    payload: Result<Json<MoodRequest>, JsonRejection>,
) -> ApiResult<MoodResponse> {
    let Json(req) = payload?;
    let locale = req.locale.as_deref().unwrap_or(DEFAULT_LOCALE);
    let reply = kindred.record_mood(&req.user_id, &req.mood, locale).await?;
    Ok(Json(MoodResponse {
        heartbeat_message: reply.heartbeat_message,
    }))
}

/// GET /api/mood/{user_id}
pub async fn list(State(kindred): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Vec<MoodEntry>> {
    Ok(Json(kindred.list_moods(&user_id).await?))
}
