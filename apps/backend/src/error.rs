//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use repertoire_core::CoreError;
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::VariationNotFound(_) | CoreError::MoveNotFound(_) | CoreError::SharedMoveNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CoreError::SharedMoveMismatch { .. } | CoreError::DuplicateVariation(_) | CoreError::DuplicateMove(_) => {
                ApiError::Conflict(err.to_string())
            }
            CoreError::InvalidShapes(_) | CoreError::InvalidIntervalTable(_) | CoreError::NothingToRelink => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Parse(_) => (StatusCode::BAD_REQUEST, "parse_error"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        let error = ApiError::NotFound("variation 123".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_request_status() {
        let error = ApiError::BadRequest("invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_error_status() {
        let error = ApiError::Parse("invalid color".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_status() {
        let error = ApiError::Conflict("position differs".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_error_status() {
        let error = ApiError::Internal("unexpected error".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_core_errors_map_to_statuses() {
        let cases = [
            (CoreError::VariationNotFound(1), StatusCode::NOT_FOUND),
            (CoreError::SharedMoveNotFound(2), StatusCode::NOT_FOUND),
            (
                CoreError::SharedMoveMismatch {
                    move_id: 3,
                    shared_move_id: 4,
                    reason: "SAN Nf3 != Nc3".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (CoreError::InvalidShapes("bad square".to_string()), StatusCode::BAD_REQUEST),
            (CoreError::NothingToRelink, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_error_display_not_found() {
        let error = ApiError::NotFound("Variation 123".to_string());
        assert_eq!(error.to_string(), "Not found: Variation 123");
    }

    #[test]
    fn test_error_display_conflict() {
        let error = ApiError::from(CoreError::SharedMoveMismatch {
            move_id: 3,
            shared_move_id: 4,
            reason: "SAN Nf3 != Nc3".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Conflict: move 3 cannot use shared move 4: SAN Nf3 != Nc3"
        );
    }

    #[test]
    fn test_error_display_internal() {
        let error = ApiError::Internal("connection lost".to_string());
        assert_eq!(error.to_string(), "Internal error: connection lost");
    }
}
