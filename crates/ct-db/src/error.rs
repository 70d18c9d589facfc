//! Error types for ct-db

use thiserror::Error;

/// Store operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Store connection failed: {0}")]
    Connection(String),

    /// A statement was rejected by the store or could not be delivered (D002)
    #[error("[D002] SQL execution failed: {message}\n  statement: {statement}")]
    Store { statement: String, message: String },

    /// The store answered with something we could not interpret (D003)
    #[error("[D003] Unexpected store response: {0}")]
    Protocol(String),
}

impl DbError {
    /// Wrap a failure of `statement`
    pub fn store(statement: &str, err: impl std::fmt::Display) -> Self {
        DbError::Store {
            statement: statement.to_string(),
            message: err.to_string(),
        }
    }

    /// Statement text of a store error
    pub fn statement(&self) -> Option<&str> {
        match self {
            DbError::Store { statement, .. } => Some(statement),
            _ => None,
        }
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
