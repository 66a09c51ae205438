//! Pool configuration types

use std::time::Duration;

use graphpool_core::ConnectionTarget;
use serde::{Deserialize, Serialize};

use crate::{PoolError, PoolResult};

/// Number of connections opened when no size is configured
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Acquire timeout used by `ConnectionPool::get` when none is configured
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 30_000;

/// Configuration for a connection pool
///
/// Set once by `ConnectionPool::initialize` and immutable afterwards.
/// Two configurations are considered the same only if every field matches,
/// credentials included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Endpoint, credentials and database for every connection
    target: ConnectionTarget,
    /// Number of connections opened at initialization
    size: usize,
    /// Timeout in milliseconds used by `get()`
    acquire_timeout_ms: u64,
}

impl PoolConfig {
    /// Create a configuration with the default size and acquire timeout
    pub fn new(target: ConnectionTarget) -> Self {
        Self {
            target,
            size: DEFAULT_POOL_SIZE,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
        }
    }

    /// Set the number of connections
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the acquire timeout in milliseconds
    pub fn with_acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }

    /// Get the connection target
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Get the database every handle is bound to
    pub fn database(&self) -> &str {
        &self.target.database
    }

    /// Get the pool size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the acquire timeout as a Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Check the configuration before any connection is opened
    pub fn validate(&self) -> PoolResult<()> {
        if self.size == 0 {
            return Err(PoolError::InvalidConfig(
                "pool size must be greater than 0".into(),
            ));
        }
        if self.target.endpoint.trim().is_empty() {
            return Err(PoolError::InvalidConfig("endpoint must not be empty".into()));
        }
        if self.target.database.trim().is_empty() {
            return Err(PoolError::InvalidConfig("database must not be empty".into()));
        }
        Ok(())
    }
}
