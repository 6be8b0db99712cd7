//! Error handling module
//!
//! HTTP-facing error type and response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::ledger::LedgerError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            AppError::Ledger(err) => match err {
                LedgerError::InvalidDirection(direction) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_direction",
                    Some(direction.clone()),
                ),
                LedgerError::InvalidRequest(domain_err) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_request",
                    Some(domain_err.to_string()),
                ),
                LedgerError::Store(store_err) => {
                    tracing::error!("Store error: {}", store_err);
                    let code = if store_err.is_timeout() {
                        "store_timeout"
                    } else {
                        "store_error"
                    };
                    (StatusCode::SERVICE_UNAVAILABLE, code, None)
                }
                LedgerError::Parse { key, .. } => {
                    tracing::error!("Corrupt ledger data: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "corrupt_ledger_data",
                        Some(key.clone()),
                    )
                }
                LedgerError::Overflow { .. } => {
                    tracing::error!("Journal replay overflow: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "ledger_overflow",
                        Some(err.to_string()),
                    )
                }
                LedgerError::Serialization(e) => {
                    tracing::error!("Journal serialization error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "journal_error", None)
                }
            },

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.parts();

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::store::StoreError;

    #[test]
    fn test_invalid_direction_is_bad_request() {
        let err = AppError::from(LedgerError::InvalidDirection("x".to_string()));
        let (status, code, details) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "invalid_direction");
        assert_eq!(details.as_deref(), Some("x"));
    }

    #[test]
    fn test_invalid_identifier_is_bad_request() {
        let err = AppError::from(LedgerError::from(DomainError::invalid_identifier("till", "")));
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_timeout_is_unavailable() {
        let err = AppError::from(LedgerError::Store(StoreError::Timeout {
            operation: "GET",
            key: "k".to_string(),
            timeout_ms: 10,
        }));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "store_timeout");
    }

    #[test]
    fn test_parse_error_is_internal() {
        let err = AppError::from(LedgerError::parse("k", "count", "abc"));
        let (status, code, details) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "corrupt_ledger_data");
        assert_eq!(details.as_deref(), Some("k"));
    }

    #[test]
    fn test_replay_overflow_is_internal() {
        let err = AppError::from(LedgerError::overflow(3, "till-1", "cash"));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "ledger_overflow");
    }
}
