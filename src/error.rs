//! Error types for tablegen.

use thiserror::Error;

/// The main error type for tablegen operations.
#[derive(Debug, Error)]
pub enum GenError {
    /// Failed to parse a catalog value (column type, index definition).
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// The connection URL names a database we cannot introspect.
    #[error("Unsupported database scheme: '{0}'. Expected: mysql, mariadb, postgres or postgresql")]
    UnsupportedBackend(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Catalog query error.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error, including a rejected write to an output sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

impl From<std::fmt::Error> for GenError {
    fn from(_: std::fmt::Error) -> Self {
        Self::Io(std::io::Error::other("output sink rejected write"))
    }
}

impl From<sqlx::Error> for GenError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Result type alias for tablegen operations.
pub type GenResult<T> = Result<T, GenError>;
