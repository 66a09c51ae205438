//! Connector, connection and session traits

use std::sync::Arc;

use async_trait::async_trait;

use crate::{ConnectionTarget, Params, Result};

/// Opens live connections to a graph database
///
/// Implemented by drivers. The pool calls `connect` once per handle while
/// initializing and never again for the lifetime of that pool.
#[async_trait]
pub trait GraphConnector: Send + Sync + 'static {
    /// Short driver identifier (e.g. "neo4j")
    fn name(&self) -> &'static str;

    /// Open one underlying connection to `target`
    async fn connect(&self, target: &ConnectionTarget) -> Result<Arc<dyn GraphConnection>>;
}

#[async_trait]
impl<T: GraphConnector> GraphConnector for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn connect(&self, target: &ConnectionTarget) -> Result<Arc<dyn GraphConnection>> {
        (**self).connect(target).await
    }
}

/// A live connection to a graph database
#[async_trait]
pub trait GraphConnection: Send + Sync {
    /// Get the driver name (e.g., "neo4j")
    fn driver_name(&self) -> &str;

    /// Start a new unit of work against `database`
    ///
    /// Sessions are independent of each other; any number may be opened
    /// over the connection's life, one after another.
    async fn begin_session(&self, database: &str) -> Result<Box<dyn GraphSession>>;

    /// Close the underlying connection
    ///
    /// Closing twice is a no-op. Sessions begun afterwards fail with
    /// `GraphError::Closed`.
    async fn close(&self) -> Result<()>;

    /// Check if the connection has been closed
    fn is_closed(&self) -> bool;
}

/// A unit of work against one database
///
/// The owner ends it with `commit` or `rollback` on every path, before the
/// connection it came from goes back to its pool.
#[async_trait]
pub trait GraphSession: Send {
    /// Run a statement, discarding any records it returns
    async fn run(&mut self, query: &str, params: &Params) -> Result<()>;

    /// Commit the work done in this session
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard the work done in this session
    async fn rollback(self: Box<Self>) -> Result<()>;
}
