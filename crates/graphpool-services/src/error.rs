use graphpool_connection::PoolError;
use graphpool_core::GraphError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Graph database error: {0}")]
    Graph(#[from] GraphError),

    #[error("Invalid entity: {0}")]
    InvalidEntity(String),
}

impl ServiceError {
    /// Whether the same call may succeed if retried later
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Pool(e) if e.is_retryable())
    }
}
