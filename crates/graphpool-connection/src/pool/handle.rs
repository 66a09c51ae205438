//! Pooled connection handles

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use graphpool_core::{GraphConnection, GraphSession, Result};
use serde::{Deserialize, Serialize};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One live connection plus the database it is bound to
///
/// Handles are created by `ConnectionPool::initialize` and never change
/// afterwards. They are not `Clone`: a handle is moved out of the pool by
/// `acquire` and moved back by `release`.
pub struct ConnectionHandle {
    id: HandleId,
    connection: Arc<dyn GraphConnection>,
    database: Arc<str>,
}

impl ConnectionHandle {
    pub(crate) fn new(connection: Arc<dyn GraphConnection>, database: Arc<str>) -> Self {
        Self {
            id: HandleId::next(),
            connection,
            database,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Database every session opened through this handle runs against
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &Arc<dyn GraphConnection> {
        &self.connection
    }

    /// Open a new unit of work on the bound database
    ///
    /// The caller ends the session with `commit` or `rollback` before the
    /// handle goes back to the pool.
    pub async fn session(&self) -> Result<Box<dyn GraphSession>> {
        tracing::trace!(handle = %self.id, database = %self.database, "opening session");
        self.connection.begin_session(&self.database).await
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("driver", &self.connection.driver_name())
            .field("database", &self.database)
            .finish()
    }
}
