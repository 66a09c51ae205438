//! Neo4j connection and session

use async_trait::async_trait;
use graphpool_core::{GraphConnection, GraphError, GraphSession, Params, Result};
use neo4rs::{Graph, Txn};
use parking_lot::Mutex;

use crate::params::to_query;

/// One Bolt connection to a Neo4j server
///
/// The `Graph` is dropped on `close`, which closes the socket.
pub struct Neo4jConnection {
    graph: Mutex<Option<Graph>>,
}

impl Neo4jConnection {
    pub(crate) fn new(graph: Graph) -> Self {
        Self {
            graph: Mutex::new(Some(graph)),
        }
    }
}

#[async_trait]
impl GraphConnection for Neo4jConnection {
    fn driver_name(&self) -> &str {
        "neo4j"
    }

    async fn begin_session(&self, database: &str) -> Result<Box<dyn GraphSession>> {
        let graph = self.graph.lock().clone().ok_or(GraphError::Closed)?;
        let txn = graph.start_txn_on(database).await.map_err(|e| {
            tracing::error!(error = %e, database = %database, "failed to begin Neo4j transaction");
            GraphError::Session(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(Box::new(Neo4jSession { txn }))
    }

    async fn close(&self) -> Result<()> {
        if self.graph.lock().take().is_some() {
            tracing::debug!("Neo4j connection closed");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.graph.lock().is_none()
    }
}

/// A Neo4j explicit transaction
pub struct Neo4jSession {
    txn: Txn,
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn run(&mut self, query: &str, params: &Params) -> Result<()> {
        tracing::trace!(query = %query, params = params.len(), "running Cypher statement");
        self.txn
            .run(to_query(query, params))
            .await
            .map_err(|e| GraphError::Query(format!("{} (query: {})", e, query)))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.txn
            .commit()
            .await
            .map_err(|e| GraphError::Session(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.txn
            .rollback()
            .await
            .map_err(|e| GraphError::Session(format!("Failed to roll back transaction: {}", e)))
    }
}
