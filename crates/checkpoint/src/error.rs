//! Error types for the checkpoint registry.
//!
//! This module defines all error types used throughout the checkpoint crate,
//! providing detailed context for debugging and operator-facing messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for checkpoint operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Entry Errors ===
    /// Required draft fields are missing; submission is blocked.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A passenger entry could not be linked to a driver crossing.
    #[error("passenger linkage rejected: {message}")]
    PassengerLink {
        /// Why the linkage was rejected.
        message: String,
    },

    /// The draft date of birth could not be interpreted.
    #[error("unparseable date of birth: {value}")]
    InvalidDate {
        /// The offending value.
        value: String,
    },

    /// A cargo argument was malformed.
    #[error("invalid cargo line: {message}")]
    InvalidCargo {
        /// Why the argument was rejected.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a passenger-linkage rejection error.
    #[must_use]
    pub fn passenger_link(message: impl Into<String>) -> Self {
        Self::PassengerLink {
            message: message.into(),
        }
    }

    /// Create a missing-fields validation error.
    #[must_use]
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::MissingFields(fields.iter().map(ToString::to_string).collect())
    }

    /// Create an invalid-date validation error.
    #[must_use]
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    /// Create a malformed-cargo validation error.
    #[must_use]
    pub fn invalid_cargo(message: impl Into<String>) -> Self {
        Self::InvalidCargo {
            message: message.into(),
        }
    }

    /// Check if this error is a local validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFields(_)
                | Self::PassengerLink { .. }
                | Self::InvalidDate { .. }
                | Self::InvalidCargo { .. }
        )
    }
}
