use axum::extract::{Path, State};
use axum::Json;

use super::{ApiResult, AppState};
use crate::leaderboard::LeaderboardEntry;
use crate::progression::Profile;

/// GET /api/profile/{user_id}
pub async fn get_profile(State(kindred): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Profile> {
    Ok(Json(kindred.get_profile(&user_id).await?))
}

/// GET /api/leaderboard
pub async fn leaderboard(State(kindred): State<AppState>) -> ApiResult<Vec<LeaderboardEntry>> {
    Ok(Json(kindred.leaderboard().await?))
}
