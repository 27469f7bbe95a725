//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jobboard_firestore::FirestoreError;
use jobboard_models::FieldViolation;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with existing data. Reported as 400.
    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldViolation>,
    },

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Request timed out")]
    RequestTimeout,

    #[error("Internal error: {0}")]
    Internal(String),

    /// 500 whose message is safe to show the client as-is.
    #[error("{0}")]
    Unexpected(String),

    #[error("Store error: {0}")]
    Store(FirestoreError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Field-level validation failure on a job posting.
    pub fn job_validation(details: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: "Job validation failed".to_string(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Conflict(_) | ApiError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) | ApiError::Unexpected(_) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<FirestoreError> for ApiError {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::DuplicateKey(_) => {
                Self::Conflict("You have already applied for this job.".to_string())
            }
            FirestoreError::Validation(details) => Self::job_validation(details),
            other => Self::Store(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldViolation>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Internal(_) | ApiError::Store(_) => {
                error!(error = %self, "Request failed with internal error");
                "Server error".to_string()
            }
            ApiError::Unexpected(_) => {
                error!(error = %self, "Request failed with unexpected error");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let details = match self {
            ApiError::Validation { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorResponse {
            message,
            success: false,
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::job_validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_internal_details_are_never_rendered() {
        let (status, body) = body_of(ApiError::internal("pool exhausted")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"message": "Server error", "success": false}));

        let store_err = FirestoreError::ServerError(503, "backend unavailable".to_string());
        let (_, body) = body_of(store_err.into()).await;
        assert_eq!(body["message"], "Server error");
    }

    #[tokio::test]
    async fn test_unexpected_message_is_rendered() {
        let (status, body) = body_of(ApiError::Unexpected("quota exceeded".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "quota exceeded");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_timeout_and_body_limit_use_envelope() {
        let (status, body) = body_of(ApiError::RequestTimeout).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body, json!({"message": "Request timed out", "success": false}));

        let (status, body) = body_of(ApiError::PayloadTooLarge).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_store_errors_map_to_domain_kinds() {
        let err: ApiError = FirestoreError::DuplicateKey("k".to_string()).into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let violation = FieldViolation::new("position", "bad", "Number", json!("x"));
        let err: ApiError = FirestoreError::Validation(vec![violation.clone()]).into();
        match err {
            ApiError::Validation { message, details } => {
                assert_eq!(message, "Job validation failed");
                assert_eq!(details, vec![violation]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err: ApiError = FirestoreError::ServerError(503, "down".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
