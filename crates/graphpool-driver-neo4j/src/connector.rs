//! Neo4j connector

use std::sync::Arc;

use async_trait::async_trait;
use graphpool_core::{ConnectionTarget, GraphConnection, GraphConnector, GraphError, Result};
use neo4rs::{ConfigBuilder, Graph, query};

use crate::Neo4jConnection;

/// Records fetched per round trip when none is configured
pub const DEFAULT_FETCH_SIZE: usize = 200;

/// Opens Bolt connections to a Neo4j server
pub struct Neo4jConnector {
    fetch_size: usize,
}

impl Neo4jConnector {
    /// Create a new Neo4j connector
    pub fn new() -> Self {
        tracing::debug!("Neo4j connector initialized");
        Self {
            fetch_size: DEFAULT_FETCH_SIZE,
        }
    }

    /// Set how many records are pulled from the server per round trip
    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size;
        self
    }
}

impl Default for Neo4jConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphConnector for Neo4jConnector {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    #[tracing::instrument(skip(self, target), fields(endpoint = %target.endpoint, database = %target.database))]
    async fn connect(&self, target: &ConnectionTarget) -> Result<Arc<dyn GraphConnection>> {
        let config = ConfigBuilder::default()
            .uri(target.endpoint.as_str())
            .user(target.credentials.user.as_str())
            .password(target.credentials.password.as_str())
            .db(target.database.as_str())
            .fetch_size(self.fetch_size)
            .max_connections(1)
            .build()
            .map_err(|e| GraphError::Configuration(format!("Invalid Neo4j configuration: {}", e)))?;

        let graph = Graph::connect(config).await.map_err(|e| {
            tracing::error!(error = %e, "failed to connect to Neo4j");
            GraphError::Connection(format!("Failed to connect to Neo4j: {}", e))
        })?;

        // The Bolt connection is opened lazily; force it now so a bad
        // endpoint or credentials fail here and not on first use
        graph.run(query("RETURN 1")).await.map_err(|e| {
            tracing::error!(error = %e, "Neo4j handshake query failed");
            GraphError::Connection(format!("Failed to reach Neo4j: {}", e))
        })?;

        tracing::info!("Neo4j connection created");
        Ok(Arc::new(Neo4jConnection::new(graph)))
    }
}
