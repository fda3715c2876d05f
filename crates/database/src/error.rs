//! Database error types.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur while talking to the conversation store.
///
/// `Connection` is the only variant that ever leaves this crate through a
/// public API (`ConnectionManager::connect`). Everything else is absorbed by
/// the recorder and reader.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Establishing the connection failed (driver message attached).
    #[error("connection error: {0}")]
    Connection(String),

    /// No live connection to run the operation on.
    #[error("not connected to the conversation store")]
    NotConnected,

    /// The record failed field validation before being written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be mapped back onto its enumeration.
    #[error("invalid {field} in stored record: {value}")]
    Decode { field: &'static str, value: String },

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DatabaseError {
    /// Short label for the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseError::Connection(_) => "connection",
            DatabaseError::NotConnected => "not_connected",
            DatabaseError::Validation(_) => "validation",
            DatabaseError::Sqlx(err) => match err {
                sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed => "network",
                sqlx::Error::Database(_) => "store",
                _ => "query",
            },
            DatabaseError::Migration(_) => "migration",
            DatabaseError::Decode { .. } => "decode",
            DatabaseError::Config(_) => "config",
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(DatabaseError::Connection("x".into()).kind(), "connection");
        assert_eq!(DatabaseError::NotConnected.kind(), "not_connected");
        assert_eq!(DatabaseError::Sqlx(sqlx::Error::PoolClosed).kind(), "network");
        assert_eq!(DatabaseError::Sqlx(sqlx::Error::RowNotFound).kind(), "query");
    }
}
