//! graphpool connection - bounded pool of pre-opened graph connections
//!
//! The pool opens a fixed number of connections up front and lends them out
//! one caller at a time through `acquire`/`release` (or the scoped
//! `PooledConnection` guard returned by `get`).

mod error;
pub mod pool;

pub use error::{PoolError, PoolResult};
pub use pool::{
    ConnectionHandle, ConnectionPool, HandleId, PoolConfig, PoolStats, PooledConnection,
    ShutdownReport, DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_POOL_SIZE,
};
