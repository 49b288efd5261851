//! Errors raised by catalog connectors

use crate::name::QualifiedName;

/// Errors that can occur while serving a catalog request
///
/// `Clone` so test doubles can hand the same failure out repeatedly.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectorError {
    #[error("Table not found: {0}")]
    TableNotFound(QualifiedName),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(QualifiedName),

    #[error("Database not found: {0}")]
    DatabaseNotFound(QualifiedName),

    #[error("Invalid name {0}: {1}")]
    InvalidName(QualifiedName, String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}
