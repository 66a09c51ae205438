//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Snapshot of a connection pool's state
///
/// `available + held == size` for every snapshot of a running pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Configured number of connections
    size: usize,
    /// Handles waiting in the pool
    available: usize,
    /// Handles currently lent out
    held: usize,
    /// Callers blocked in `acquire`
    waiting: usize,
}

impl PoolStats {
    /// Create new pool statistics
    pub fn new(size: usize, available: usize, held: usize, waiting: usize) -> Self {
        Self {
            size,
            available,
            held,
            waiting,
        }
    }

    /// Get the configured pool size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the number of handles available for acquire
    pub fn available(&self) -> usize {
        self.available
    }

    /// Get the number of handles currently held by callers
    pub fn held(&self) -> usize {
        self.held
    }

    /// Get the number of callers waiting for a handle
    pub fn waiting(&self) -> usize {
        self.waiting
    }
}

impl Default for PoolStats {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}
