use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState, DEFAULT_LOCALE};
use crate::service::ChatReply;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub locale: Option<String>,
}

/// POST /api/chat
pub async fn submit(
    State(kindred): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatReply> {
    let Json(req) = payload?;
    let locale = req.locale.as_deref().unwrap_or(DEFAULT_LOCALE);

    tracing::info!(user_id = %req.user_id, message_len = req.message.len(), "chat turn submitted");
    let reply = kindred.submit_chat_turn(&req.user_id, &req.message, locale).await?;
    Ok(Json(reply))
}
