//! HTTP surface over [`Kindred`].
//!
//! Handlers are thin: decode the body, call one service operation, encode the
//! result. Every failure is rendered as `{"error": "<message>"}` with the
//! status from [`status_for`].

pub mod admin;
pub mod chat;
pub mod daily;
pub mod mood;
pub mod profile;
pub mod shop;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

use crate::error::KindredError;
use crate::service::Kindred;

pub type AppState = Arc<Kindred>;

/// Result type for JSON handlers.
pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Locale used when a request does not name one.
pub const DEFAULT_LOCALE: &str = "en";

/// Build the full router.
pub fn router(kindred: Arc<Kindred>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/api/chat", post(chat::submit))
        .route("/api/mood", post(mood::record))
        .route("/api/mood/{user_id}", get(mood::list))
        .route("/api/profile/{user_id}", get(profile::get_profile))
        .route("/api/shop", get(shop::list))
        .route("/api/shop/purchase", post(shop::purchase))
        .route("/api/shop/{item_id}", get(shop::preview))
        .route("/api/leaderboard", get(profile::leaderboard))
        .route("/api/daily/answer", post(daily::answer_question))
        .route("/api/daily/question/{user_id}", get(daily::question))
        .route("/api/daily/oracle", get(daily::oracle))
        .route("/api/admin/points", post(admin::add_points))
        .with_state(kindred)
}

async fn ping() -> &'static str {
    "pong"
}

/// Wraps [`KindredError`] for rendering as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub KindredError);

impl From<KindredError> for ApiError {
    fn from(err: KindredError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(KindredError::Validation(rejection.body_text()))
    }
}

pub fn status_for(err: &KindredError) -> StatusCode {
    match err {
        KindredError::Validation(_) => StatusCode::BAD_REQUEST,
        KindredError::Forbidden => StatusCode::FORBIDDEN,
        KindredError::NotFound(_) => StatusCode::NOT_FOUND,
        KindredError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
        KindredError::Upstream(_) => StatusCode::BAD_GATEWAY,
        KindredError::Storage(_)
        | KindredError::Database(_)
        | KindredError::Serialization(_)
        | KindredError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            // server-side detail stays in the log
            tracing::error!(error = %self.0, status = status.as_u16(), "request failed");
            match self.0 {
                KindredError::Upstream(_) => "upstream provider unavailable".to_string(),
                _ => "internal error".to_string(),
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(status_for(&KindredError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&KindredError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&KindredError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&KindredError::InsufficientFunds { needed: 5, available: 1 }),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(status_for(&KindredError::Upstream("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&KindredError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
