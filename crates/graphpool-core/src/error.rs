//! Error types for graph database access

use thiserror::Error;

/// Core error type for graph connections and sessions
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
