//! Core error types for bandprep-core.
//!
//! Storage and configuration failures are grouped under [`CoreError`]; the
//! user-facing practice flow reports through [`PracticeError`], and the remote
//! completion service through [`CompletionError`].

use std::path::PathBuf;
use thiserror::Error;

use crate::wordcount::ValidationWarning;

/// Core error type for bandprep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home or data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Failures of the remote text-completion service.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Remote { message: String },

    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured endpoint does not form a valid URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A success response without generated text at the expected path.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced to the user by the practice flow.
#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("Please save your API key first")]
    MissingSecret,

    #[error("{message}")]
    Remote { message: String },

    #[error("No active task")]
    NoActiveSession,

    #[error("Task text is empty")]
    EmptyTask,

    #[error("Please write your response first")]
    EmptyResponse,

    #[error("{0}")]
    BelowMinimum(ValidationWarning),

    /// The same action is already waiting on the remote service.
    #[error("A {0} request is already in progress")]
    Busy(&'static str),

    #[error(transparent)]
    Completion(CompletionError),
}

impl From<CompletionError> for PracticeError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Remote { message } => PracticeError::Remote { message },
            other => PracticeError::Completion(other),
        }
    }
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
