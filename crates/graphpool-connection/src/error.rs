//! Pool error types

use std::time::Duration;

use graphpool_core::GraphError;
use thiserror::Error;

use crate::pool::HandleId;

pub type PoolResult<T> = Result<T, PoolError>;

/// Errors returned by `ConnectionPool` operations
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// Opening connection `attempt` (1-based) of `size` failed; nothing was kept
    #[error("Failed to open connection {attempt} of {size}: {source}")]
    InitializationFailure {
        attempt: usize,
        size: usize,
        #[source]
        source: GraphError,
    },

    #[error("Pool is already initialized with a different configuration")]
    ConfigurationConflict,

    #[error("Pool is not initialized")]
    NotInitialized,

    #[error("Timed out waiting for connection (timeout: {timeout:?})")]
    PoolExhausted { timeout: Duration },

    #[error("Pool is closed")]
    PoolClosed,

    #[error("Connection handle {0} is not checked out from this pool")]
    DoubleRelease(HandleId),

    #[error("Failed to close connection {handle}: {source}")]
    CloseFailure {
        handle: HandleId,
        #[source]
        source: GraphError,
    },
}

impl PoolError {
    /// Whether retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::PoolExhausted { .. })
    }
}
