//! Error taxonomy shared by every engine component.
//!
//! Engine functions return [`Result`]; the HTTP layer maps each variant to a
//! status code and the binary edge wraps everything in `anyhow`.

use thiserror::Error;

/// Result type alias using [`KindredError`].
pub type Result<T> = std::result::Result<T, KindredError>;

#[derive(Debug, Error)]
pub enum KindredError {
    /// Provider returned a non-success status, malformed body, or timed out.
    #[error("upstream provider failed: {0}")]
    Upstream(String),

    /// Missing or malformed required field. Nothing was written.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient funds: need {needed} points, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("forbidden")]
    Forbidden,

    /// Unreadable or corrupt persisted state.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl KindredError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// `true` for failures caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::InsufficientFunds { .. } | Self::Forbidden
        )
    }
}

impl From<tokio::task::JoinError> for KindredError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_message_names_both_amounts() {
        let err = KindredError::InsufficientFunds {
            needed: 50,
            available: 45,
        };
        assert_eq!(err.to_string(), "insufficient funds: need 50 points, have 45");
        assert!(err.is_client_error());
    }

    #[test]
    fn database_errors_are_server_side() {
        let err = KindredError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_client_error());
    }
}
