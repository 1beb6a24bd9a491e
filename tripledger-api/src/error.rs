/// Error handling for the API server
///
/// A unified error type that maps to HTTP responses. All handlers
/// return `Result<T, ApiError>`, which converts automatically into a
/// JSON body of the shape `{ "error": <code>, "message": <text> }`
/// with the matching status code.
///
/// Taxonomy (status codes map 1:1):
/// - `Validation` (400): missing or malformed required fields
/// - `InvalidReference` (400): foreign reference that is dangling or
///   owned by another user
/// - `ResourceInUse` (400): delete blocked by dependent rows
/// - `Unauthorized` (401): missing/expired/invalid token or bad login
/// - `NotFound` (404): entity absent or not owned by the caller
/// - `AlreadyExists` (409): duplicate per-user name
/// - `Internal` (500): unexpected persistence failure

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed required fields (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Dangling or cross-owner foreign reference (400)
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Delete blocked while dependents exist (400)
    #[error("Resource in use: {0}")]
    ResourceInUse(String),

    /// Missing, expired, or invalid credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Entity absent or not owned by the caller (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate name scoped to the owner (409)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Unexpected persistence failure (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_error", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Status code and wire-level error code for this error
    pub fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::InvalidReference(_) => (StatusCode::BAD_REQUEST, "invalid_reference"),
            ApiError::ResourceInUse(_) => (StatusCode::BAD_REQUEST, "resource_in_use"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();

        let message = match self {
            // Log internal errors but don't expose details to clients
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            ApiError::Validation(msg)
            | ApiError::InvalidReference(msg)
            | ApiError::ResourceInUse(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::AlreadyExists(msg) => msg,
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return ApiError::AlreadyExists("Name already exists".to_string());
                }
                if db_err.is_foreign_key_violation() {
                    // RESTRICT on categoria/meio_pagamento delete, or a
                    // dangling reference that slipped past validation
                    return ApiError::ResourceInUse(
                        "Operation blocked by dependent rows".to_string(),
                    );
                }
                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert JWT errors to API errors
impl From<tripledger_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: tripledger_shared::auth::jwt::JwtError) -> Self {
        use tripledger_shared::auth::jwt::JwtError;

        match err {
            JwtError::Expired => ApiError::Unauthorized("Token has expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::ValidationError(_) => ApiError::Unauthorized("Token is invalid".to_string()),
            JwtError::CreateError(msg) => ApiError::Internal(msg),
        }
    }
}

/// Convert password errors to API errors
impl From<tripledger_shared::auth::password::PasswordError> for ApiError {
    fn from(err: tripledger_shared::auth::password::PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Validation("nome_viagem is required".to_string());
        assert_eq!(err.to_string(), "Validation error: nome_viagem is required");

        let err = ApiError::NotFound("Trip not found".to_string());
        assert_eq!(err.to_string(), "Not found: Trip not found");
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ApiError::Validation(String::new()).parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidReference(String::new()).parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ResourceInUse(String::new()).parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized(String::new()).parts().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound(String::new()).parts().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::AlreadyExists(String::new()).parts().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(String::new()).parts().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_jwt_error_conversion() {
        use tripledger_shared::auth::jwt::JwtError;

        let err: ApiError = JwtError::Expired.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err: ApiError = JwtError::ValidationError("bad".to_string()).into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_row_not_found_conversion() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
