//! Connection pooling for graph database connections
//!
//! This module provides a fixed-size pool: every connection is opened during
//! `initialize`, lent out by `acquire`, taken back by `release`, and closed
//! only by `shutdown`.
//!
//! # Example
//!
//! ```ignore
//! use graphpool_connection::pool::{ConnectionPool, PoolConfig};
//!
//! let pool = Arc::new(ConnectionPool::new(connector));
//! pool.initialize(PoolConfig::new(target).with_size(5)).await?;
//!
//! {
//!     let conn = pool.get().await?;
//!     let mut session = conn.session().await?;
//!     session.run("RETURN 1", &Params::new()).await?;
//!     session.commit().await?;
//!     // Handle returned to pool on drop
//! }
//!
//! pool.shutdown().await;
//! ```

mod config;
mod handle;
mod pool;
mod stats;


pub use config::{DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_POOL_SIZE, PoolConfig};
pub use handle::{ConnectionHandle, HandleId};
pub use pool::{ConnectionPool, PooledConnection, ShutdownReport};
pub use stats::PoolStats;
