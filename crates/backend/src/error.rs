//! Unified error handling for the backend API.
//!
//! Handlers return [`ApiResult`] and use `?`; every variant maps to a status
//! code and a JSON [`ErrorResponse`] body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub use shared_types::ErrorResponse;

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database connection pool error
    #[error("Database connection error")]
    ConnectionPool(#[source] diesel_async::pooled_connection::deadpool::PoolError),

    /// Database query error
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Generic database/anyhow error
    #[error("{0}")]
    Internal(#[from] anyhow::Error),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body failed field validation
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Unique constraint or state conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication required but not provided or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Too many requests")]
    RateLimited,
}

impl ApiError {
    /// Create a not found error with a custom message
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(diesel::result::Error::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for ApiError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        ApiError::ConnectionPool(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::ConnectionPool(e) => {
                tracing::error!("Connection pool error: {:?}", e);
                ErrorResponse::new("Database connection unavailable")
            }
            ApiError::Database(diesel::result::Error::NotFound) => {
                ErrorResponse::new("Resource not found")
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorResponse::new("Database operation failed")
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                ErrorResponse::new("Internal server error")
            }
            ApiError::NotFound(resource) => ErrorResponse::new(format!("{} not found", resource)),
            ApiError::BadRequest(msg) => ErrorResponse::new(msg.clone()),
            ApiError::Validation(errors) => {
                tracing::debug!("Validation failed: {}", errors);
                ErrorResponse::with_details("Validation failed", errors.to_string())
            }
            ApiError::Conflict(msg) => ErrorResponse::new(msg.clone()),
            ApiError::Unauthorized(msg) => ErrorResponse::new(msg.clone()),
            ApiError::RateLimited => {
                ErrorResponse::new("Too many attempts, please try again later")
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Database(diesel::result::Error::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(diesel::result::Error::RollbackTransaction).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::not_found("Shift").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::bad_request("no").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Conflict("taken".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::unauthorized("who").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let request = shared_types::CreateWorkplaceRequest {
            name: String::new(),
            hourly_rate_cents: None,
            color: None,
            address: None,
        };
        let err: ApiError = request.validate().unwrap_err().into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("Workplace");
        assert_eq!(err.to_string(), "Workplace not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
