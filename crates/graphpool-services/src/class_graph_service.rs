//! Class graph service
//!
//! Writes classes, their properties and the calls between them. Every write
//! borrows one pooled connection, runs inside one session and either commits
//! or rolls back before the connection goes back to the pool.

use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use graphpool_connection::{ConnectionPool, PooledConnection};
use graphpool_core::{GraphSession, Params};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{ClassNode, MethodCall, PropertyNode};

const MERGE_CLASS: &str = "MERGE (c:Class {name: $name, package: $package}) \
     SET c.file_path = $file_path, c.type = $type";

const MERGE_PROPERTY: &str = "MATCH (c:Class {name: $class_name, package: $class_package}) \
     MERGE (p:Property {name: $prop_name, type: $prop_type}) \
     MERGE (c)-[:HAS_PROPERTY]->(p)";

const MERGE_CALL: &str = "MATCH (c1:Class {name: $class_name, package: $class_package}) \
     MERGE (c2:Class {name: $target_class, package: $target_package}) \
     MERGE (c1)-[r:CALLS]->(c2) \
     SET r.source_method = $source_method, r.target_method = $target_method, \
     r.target_package = $target_package, r.source_package = $source_package, \
     r.source_class = $source_class";

const DELETE_ALL: &str = "MATCH (n) DETACH DELETE n";

/// Totals for a batch of written classes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub classes: usize,
    pub properties: usize,
    pub calls: usize,
}

impl WriteSummary {
    fn of(classes: &[ClassNode]) -> Self {
        classes.iter().fold(Self::default(), |summary, class| Self {
            classes: summary.classes + 1,
            properties: summary.properties + class.properties.len(),
            calls: summary.calls + class.calls.len(),
        })
    }
}

/// Service that writes class structure into the graph
pub struct ClassGraphService {
    pool: Arc<ConnectionPool>,
    /// Overrides the pool's configured acquire timeout
    acquire_timeout: Option<Duration>,
}

impl ClassGraphService {
    /// Create a new class graph service over a shared pool
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            acquire_timeout: None,
        }
    }

    /// Wait at most `timeout` for a pooled connection
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    async fn connection(&self) -> ServiceResult<PooledConnection<'_>> {
        let conn = match self.acquire_timeout {
            Some(timeout) => self.pool.get_timeout(timeout).await?,
            None => self.pool.get().await?,
        };
        Ok(conn)
    }

    /// Write one class, its properties and its outgoing calls in a single
    /// transaction
    #[tracing::instrument(skip(self, class), fields(class = %class.name, package = %class.package))]
    pub async fn add_class(&self, class: &ClassNode) -> ServiceResult<()> {
        if class.name.trim().is_empty() {
            return Err(ServiceError::InvalidEntity(format!(
                "class in {} has no name",
                class.file_path
            )));
        }

        let conn = self.connection().await?;
        let mut session = conn.session().await?;
        match write_class(session.as_mut(), class).await {
            Ok(()) => session.commit().await?,
            Err(e) => {
                if let Err(rollback) = session.rollback().await {
                    tracing::warn!(error = %rollback, "failed to roll back class write");
                }
                return Err(e);
            }
        }

        tracing::debug!(
            handle = %conn.id(),
            properties = class.properties.len(),
            calls = class.calls.len(),
            "class written"
        );
        Ok(())
    }

    /// Write many classes, running as many writes at once as the pool has
    /// connections. Stops at the first failure.
    pub async fn add_classes(&self, classes: &[ClassNode]) -> ServiceResult<WriteSummary> {
        let concurrency = self.pool.stats().size().max(1);
        tracing::info!(classes = classes.len(), concurrency, "writing classes");

        futures::stream::iter(classes.iter().map(Ok::<_, ServiceError>))
            .try_for_each_concurrent(concurrency, |class| self.add_class(class))
            .await?;

        Ok(WriteSummary::of(classes))
    }

    /// Delete every node and relationship in the database
    #[tracing::instrument(skip(self))]
    pub async fn clear_graph(&self) -> ServiceResult<()> {
        let conn = self.connection().await?;
        let mut session = conn.session().await?;
        if let Err(e) = session.run(DELETE_ALL, &Params::new()).await {
            if let Err(rollback) = session.rollback().await {
                tracing::warn!(error = %rollback, "failed to roll back graph cleanup");
            }
            return Err(e.into());
        }
        session.commit().await?;
        tracing::info!(database = %conn.database(), "graph cleared");
        Ok(())
    }
}

async fn write_class(session: &mut dyn GraphSession, class: &ClassNode) -> ServiceResult<()> {
    let params = Params::new()
        .with("name", class.name.as_str())
        .with("package", class.package.as_str())
        .with("file_path", class.file_path.as_str())
        .with("type", class.kind.as_str());
    session.run(MERGE_CLASS, &params).await?;

    for property in &class.properties {
        session
            .run(MERGE_PROPERTY, &property_params(class, property))
            .await?;
    }

    for call in &class.calls {
        session.run(MERGE_CALL, &call_params(class, call)).await?;
    }
    Ok(())
}

fn property_params(class: &ClassNode, property: &PropertyNode) -> Params {
    Params::new()
        .with("class_name", class.name.as_str())
        .with("class_package", class.package.as_str())
        .with("prop_name", property.name.as_str())
        .with("prop_type", property.type_name.as_str())
}

fn call_params(class: &ClassNode, call: &MethodCall) -> Params {
    Params::new()
        .with("class_name", class.name.as_str())
        .with("class_package", class.package.as_str())
        .with("source_package", call.source_package.as_str())
        .with("source_class", call.source_class.as_str())
        .with("source_method", call.source_method.as_str())
        .with("target_package", call.target_package.as_str())
        .with("target_class", call.target_class.as_str())
        .with("target_method", call.target_method.as_str())
}
