//! Core error types for reveille-core.
//!
//! CRUD operations surface `NotFound`/`Conflict` conditions as values the
//! caller can branch on rather than panicking; validation happens at the
//! boundary before a record enters the store.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for reveille-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Alarm id unknown to the store
    #[error("Alarm not found: {0}")]
    AlarmNotFound(String),

    /// Override id unknown to the store
    #[error("Override not found: {0}")]
    OverrideNotFound(String),

    /// An override already exists for this alarm and date; update or delete
    /// the existing one instead
    #[error("An override already exists for alarm {alarm_id} on {target_date}")]
    DuplicateOverride {
        alarm_id: String,
        target_date: NaiveDate,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors, raised before a value enters the store.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Malformed time-of-day string
    #[error("Invalid time '{0}': expected 24-hour HH:MM")]
    InvalidTime(String),

    /// Day name that is neither a full nor a three-letter weekday
    #[error("Unknown day of week: '{0}'")]
    UnknownDay(String),

    /// Malformed date string
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Persistence errors.
///
/// Writes are logged and the in-memory state stands; reads after the initial
/// load degrade to an empty collection.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read a record file
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a record file
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record file exists but does not parse
    #[error("Failed to parse {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be serialized
    #[error("Failed to serialize records: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Data directory could not be determined or created
    #[error("Failed to prepare data directory {path}: {message}")]
    DataDirFailed { path: PathBuf, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
