use thiserror::Error;

use crate::codes;

/// Application-level error shared by the ClaimTrack binaries
#[derive(Error, Debug)]
pub enum ClaimTrackError {
    /// Batch-aborting import failure
    #[error("Import error: {message}")]
    Import { code: &'static str, message: String },

    /// Referenced claim or annotation does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an invalid value
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Database operation errors
    #[error("Database error: {message}")]
    DatabaseError { code: &'static str, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Server startup or runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClaimTrackError {
    pub fn import(code: &'static str, message: impl Into<String>) -> Self {
        Self::Import {
            code,
            message: message.into(),
        }
    }

    pub fn database(code: &'static str, message: impl Into<String>) -> Self {
        Self::DatabaseError {
            code,
            message: message.into(),
        }
    }

    /// Stable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Import { code, .. } | Self::DatabaseError { code, .. } => *code,
            Self::NotFound(_) => codes::claims::NOT_FOUND,
            Self::ValidationError(_) => codes::claims::INVALID_INPUT,
            Self::ConfigError(_) => codes::config::INVALID_CONFIG,
            Self::ServerError(_) => codes::server::STARTUP_FAILED,
            Self::Other(_) => codes::server::INTERNAL,
        }
    }

    /// Short category name used in structured logs
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Import { .. } => "import",
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation",
            Self::DatabaseError { .. } => "database",
            Self::ConfigError(_) => "config",
            Self::ServerError(_) => "server",
            Self::Other(_) => "internal",
        }
    }
}

/// Result type alias for ClaimTrack operations
pub type Result<T> = std::result::Result<T, ClaimTrackError>;

/// Log an error with its code before it is reported to the operator
pub fn log_error(context: &str, error: &ClaimTrackError) {
    tracing::error!(
        context = context,
        error_code = error.code(),
        error_type = error.error_type(),
        error = %error,
        "ClaimTrack error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_keeps_code() {
        let err = ClaimTrackError::import(codes::import::FILE_NOT_FOUND, "File not found: x.json");
        assert_eq!(err.code(), "IMPORT_1001");
        assert_eq!(err.error_type(), "import");
        assert_eq!(err.to_string(), "Import error: File not found: x.json");
    }

    #[test]
    fn test_fixed_codes_per_variant() {
        assert_eq!(ClaimTrackError::NotFound("claim 9".into()).code(), codes::claims::NOT_FOUND);
        assert_eq!(ClaimTrackError::ConfigError("bad".into()).code(), codes::config::INVALID_CONFIG);
        let other: ClaimTrackError = anyhow::anyhow!("boom").into();
        assert_eq!(other.code(), codes::server::INTERNAL);
    }
}
