use error_common::{codes, ClaimTrackError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Cannot determine file format for {0}. Please specify --format")]
    UnknownFormat(PathBuf),

    #[error("Invalid JSON file: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid JSON format. Expected array of records or object with \"{0}\" key")]
    InvalidShape(String),

    #[error("Error reading CSV file: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record {record}: invalid {field} value {value:?}")]
    Coercion {
        record: usize,
        field: &'static str,
        value: String,
    },

    #[error("Claim {0} not found")]
    ClaimNotFound(String),

    #[error("Flag {0} not found")]
    FlagNotFound(i64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type ClaimsResult<T> = Result<T, ClaimsError>;

impl From<ClaimsError> for ClaimTrackError {
    fn from(err: ClaimsError) -> Self {
        let message = err.to_string();
        match err {
            ClaimsError::FileNotFound(_) => Self::import(codes::import::FILE_NOT_FOUND, message),
            ClaimsError::UnknownFormat(_) => Self::import(codes::import::UNKNOWN_FORMAT, message),
            ClaimsError::InvalidJson(_) => Self::import(codes::import::INVALID_JSON, message),
            ClaimsError::InvalidShape(_) => Self::import(codes::import::INVALID_SHAPE, message),
            ClaimsError::Csv(_) => Self::import(codes::import::UNREADABLE_CSV, message),
            ClaimsError::Io(_) => Self::import(codes::import::IO_FAILURE, message),
            ClaimsError::Coercion { .. } => Self::import(codes::import::STRICT_COERCION, message),
            ClaimsError::ClaimNotFound(_) | ClaimsError::FlagNotFound(_) => Self::NotFound(message),
            ClaimsError::Validation(_) => Self::ValidationError(message),
            ClaimsError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_)) => {
                Self::database(codes::database::CONNECTION_FAILED, message)
            }
            ClaimsError::Database(_) => Self::database(codes::database::QUERY_FAILED, message),
            ClaimsError::Migration(_) => Self::database(codes::database::MIGRATION_FAILED, message),
            ClaimsError::Config(_) => Self::ConfigError(message),
        }
    }
}
