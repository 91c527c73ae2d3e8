use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::service::lookup::LookupError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Lookup failed: {0}")]
    TransportFailure(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        ApiError::InvalidTransition(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::MissingWindow => ApiError::ValidationError(err.to_string()),
            StoreError::Io(_) | StoreError::Serialization(_) => {
                tracing::error!(error = %err, "Tournament store failure");
                ApiError::StorageError(err.to_string())
            }
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::InvalidInput(message) => ApiError::ValidationError(message),
            other => ApiError::TransportFailure(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
    details: Option<String>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidTransition(_) => StatusCode::CONFLICT,
            ApiError::SessionExpired => StatusCode::GONE,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
            ApiError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            ApiError::TransportFailure(_) => "Something went wrong, please try again later".to_string(),
            ApiError::StorageError(_) => "Storage error".to_string(),
            _ => self.to_string(),
        };

        let error_response = ErrorResponse {
            error: message,
            code: status.as_u16(),
            details: Some(self.to_string()),
        };

        HttpResponse::build(status).json(error_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_user_facing_kinds() {
        let not_found: ApiError = StoreError::NotFound("Cup1".to_string()).into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let missing: ApiError = StoreError::MissingWindow.into();
        assert!(matches!(missing, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::SessionExpired.status_code().as_u16(), 410);
        assert_eq!(ApiError::invalid_transition("x").status_code().as_u16(), 409);
        assert_eq!(ApiError::TransportFailure("x".into()).status_code().as_u16(), 502);
        assert_eq!(ApiError::validation("x").status_code().as_u16(), 400);
        assert_eq!(ApiError::forbidden("x").status_code().as_u16(), 403);
    }

    #[test]
    fn test_storage_failure_is_internal_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ApiError = StoreError::Io(io).into();
        assert!(matches!(err, ApiError::StorageError(_)));
        assert_eq!(err.status_code().as_u16(), 500);
    }
}
