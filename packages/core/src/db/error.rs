//! Store Error Types
//!
//! This module defines error types for storage operations, providing
//! clear error handling for connection, initialization, query and
//! transaction failures.

use std::path::PathBuf;
use thiserror::Error;

/// Storage operation errors
///
/// Covers all error cases of the store implementations. Structural rule
/// violations (illegal moves, unsaved nodes) are reported by the service
/// layer instead.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A row could not be converted into a node
    #[error("Failed to decode row: {context}")]
    RowDecode { context: String },

    /// Row rejected before reaching storage
    #[error("Invalid row: {context}")]
    InvalidRow { context: String },

    /// Begin, commit or rollback failed
    #[error("Transaction failed: {context}")]
    TransactionFailed { context: String },
}

impl StoreError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a row decode error
    pub fn row_decode(context: impl Into<String>) -> Self {
        Self::RowDecode {
            context: context.into(),
        }
    }

    /// Create an invalid row error
    pub fn invalid_row(context: impl Into<String>) -> Self {
        Self::InvalidRow {
            context: context.into(),
        }
    }

    /// Create a transaction failed error
    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }
}
