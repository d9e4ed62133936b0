use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState};
use crate::daily::question::{AnswerOutcome, QuestionView};
use crate::service::OracleView;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub user_id: String,
    pub choice_index: i64,
}

/// GET /api/daily/question/{user_id}
pub async fn question(State(kindred): State<AppState>, Path(user_id): Path<String>) -> ApiResult<QuestionView> {
    Ok(Json(kindred.daily_question(&user_id).await?))
}

/// POST /api/daily/answer
pub async fn answer_question(
    State(kindred): State<AppState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> ApiResult<AnswerOutcome> {
    let Json(req) = payload?;
    Ok(Json(kindred.answer_daily_question(&req.user_id, req.choice_index).await?))
}

/// GET /api/daily/oracle
pub async fn oracle(State(kindred): State<AppState>) -> ApiResult<OracleView> {
    Ok(Json(kindred.daily_oracle().await?))
}
