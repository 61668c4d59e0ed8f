//! Core error types for tomatick-core.
//!
//! One enum per subsystem, rolled up into [`CoreError`] via `#[from]`
//! conversions so callers can use `?` across module boundaries.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tomatick-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote sync errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// History import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Configuration-specific errors.
///
/// Invalid timer settings are rejected here, at the mutation boundary;
/// the timer engine itself never receives out-of-range values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Remote mirror errors. Always non-fatal for local state.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No remote identity configured
    #[error("No remote identity configured (set sync.base_url and sync.user_id)")]
    NotConfigured,

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote returned an unexpected status
    #[error("Remote returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// Remote payload could not be decoded
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

/// History import errors.
///
/// An import that fails entirely leaves the existing session log untouched.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Input contained no rows at all
    #[error("Import input is empty")]
    Empty,

    /// Every row was malformed
    #[error("No valid rows in import ({skipped} malformed rows skipped)")]
    NoValidRows { skipped: usize },

    /// Could not read the input
    #[error("Failed to read import input: {0}")]
    Read(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
