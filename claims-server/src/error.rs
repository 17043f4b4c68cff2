use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use claims_service::ClaimsError;
use error_common::{codes, ClaimTrackError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error category
    pub error_type: String,
    /// Stable error code, e.g. `IMPORT_1003`
    pub code: String,
    /// Human-readable error message
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// Response metadata for pagination
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Fatal import failure; the file was rejected as a whole
    #[error("Import failed: {message}")]
    Import { code: &'static str, message: String },

    #[error("Database error: {message}")]
    Database { code: &'static str, message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Import { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database { code, .. } if *code == codes::database::CONNECTION_FAILED => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Database { .. } | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Import { .. } => "import_error",
            ApiError::Database { .. } => "database_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Stable error code shared with the CLI
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => codes::claims::INVALID_INPUT,
            ApiError::NotFound { .. } => codes::claims::NOT_FOUND,
            ApiError::Import { code, .. } | ApiError::Database { code, .. } => *code,
            ApiError::Internal { .. } => codes::server::INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        // Log the error with correlation ID
        error!(
            error_id = %error_id,
            error_type = %self.error_type(),
            code = %self.code(),
            status_code = %status_code.as_u16(),
            error = %logger_redacted::redact(&self.to_string()),
            "API error occurred"
        );

        // Database details stay in the log
        let message = match &self {
            ApiError::Database { .. } => "Database operation failed. Please try again.".to_string(),
            _ => self.to_string(),
        };

        let error_response = ApiErrorResponse {
            error_id,
            error_type: self.error_type().to_string(),
            code: self.code().to_string(),
            message,
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl From<ClaimsError> for ApiError {
    fn from(err: ClaimsError) -> Self {
        match ClaimTrackError::from(err) {
            ClaimTrackError::Import { code, message } => ApiError::Import { code, message },
            ClaimTrackError::NotFound(resource) => ApiError::NotFound { resource },
            ClaimTrackError::ValidationError(message) => ApiError::Validation { message },
            ClaimTrackError::DatabaseError { code, message } => ApiError::Database { code, message },
            other => ApiError::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest {
            message: format!("Invalid multipart body: {}", err.body_text()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal(format!("Failed to spool upload: {}", err))
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        metadata: None,
    }
}

/// Helper function to create successful API responses with metadata
pub fn api_success_with_meta<T>(data: T, metadata: ResponseMetadata) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        metadata: Some(metadata),
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_errors_map_to_status() {
        let missing: ApiError = ClaimsError::ClaimNotFound("30001".into()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), codes::claims::NOT_FOUND);

        let shape: ApiError = ClaimsError::InvalidShape("claims".into()).into();
        assert_eq!(shape.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(shape.code(), codes::import::INVALID_SHAPE);

        let invalid: ApiError = ClaimsError::Validation("reason must not be empty".into()).into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_io_failure_is_internal() {
        let err: ApiError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), codes::server::INTERNAL);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_connection_failure_is_unavailable() {
        let err = ApiError::Database {
            code: codes::database::CONNECTION_FAILED,
            message: "refused".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_type(), "database_error");
    }
}
