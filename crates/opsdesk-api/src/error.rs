//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use opsdesk_chat::ChatError;
use opsdesk_core::error::OpsdeskError;
use opsdesk_insight::InsightError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 401 Unauthorized - missing or invalid identity.
    Unauthorized,
    /// 404 Not Found - resource does not exist or belongs to someone else.
    NotFound(String),
    /// 500 Internal Server Error. The detail is logged, not returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<OpsdeskError> for ApiError {
    fn from(err: OpsdeskError) -> Self {
        match err {
            OpsdeskError::Validation(msg) => ApiError::BadRequest(msg),
            OpsdeskError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(msg) => ApiError::BadRequest(msg),
            ChatError::Unauthorized => ApiError::Unauthorized,
            ChatError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            ChatError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::InvalidWindow(msg) => ApiError::BadRequest(msg),
            InsightError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            InsightError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let resp = ApiError::Internal("database is locked at /secret/path".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "Internal server error");
    }

    #[test]
    fn test_chat_error_mapping() {
        assert!(matches!(
            ApiError::from(ChatError::Validation("empty".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ChatError::Unauthorized),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(ChatError::Storage("x".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_insight_error_mapping() {
        assert!(matches!(
            ApiError::from(InsightError::InvalidWindow("0".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(InsightError::NotFound("batch".into())),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_opsdesk_error_mapping() {
        assert!(matches!(
            ApiError::from(OpsdeskError::NotFound("session".into())),
            ApiError::NotFound(ref m) if m == "session not found"
        ));
        assert!(matches!(
            ApiError::from(OpsdeskError::Storage("io".into())),
            ApiError::Internal(_)
        ));
    }
}
