//! Common test utilities and mocks

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use graphpool_connection::{ConnectionPool, PoolConfig};
use graphpool_core::{
    ConnectionTarget, Credentials, GraphConnection, GraphConnector, GraphError, GraphSession,
    Params, Result,
};

/// Something that happened on a mock session, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Begin(String),
    Run(String, Params),
    Commit,
    Rollback,
}

/// Shared log of every session event across all mock connections
#[derive(Default, Clone)]
pub struct EventLog {
    events: Arc<parking_lot::Mutex<Vec<Event>>>,
}

impl EventLog {
    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Run(query, _) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|event| *event == wanted).count()
    }
}

/// Mock connector whose sessions record into an `EventLog`.
///
/// Statements containing `fail_on` fail with a query error.
pub struct RecordingConnector {
    pub log: EventLog,
    pub fail_on: Option<String>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self {
            log: EventLog::default(),
            fail_on: None,
        }
    }

    pub fn failing_on(pattern: impl Into<String>) -> Self {
        Self {
            fail_on: Some(pattern.into()),
            ..Self::new()
        }
    }
}

#[async_trait]
impl GraphConnector for RecordingConnector {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn connect(&self, _target: &ConnectionTarget) -> Result<Arc<dyn GraphConnection>> {
        Ok(Arc::new(RecordingConnection {
            log: self.log.clone(),
            fail_on: self.fail_on.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct RecordingConnection {
    log: EventLog,
    fail_on: Option<String>,
    closed: AtomicBool,
}

#[async_trait]
impl GraphConnection for RecordingConnection {
    fn driver_name(&self) -> &str {
        "recording"
    }

    async fn begin_session(&self, database: &str) -> Result<Box<dyn GraphSession>> {
        if self.is_closed() {
            return Err(GraphError::Closed);
        }
        self.log.push(Event::Begin(database.to_string()));
        Ok(Box::new(RecordingSession {
            log: self.log.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct RecordingSession {
    log: EventLog,
    fail_on: Option<String>,
}

#[async_trait]
impl GraphSession for RecordingSession {
    async fn run(&mut self, query: &str, params: &Params) -> Result<()> {
        if let Some(pattern) = &self.fail_on {
            if query.contains(pattern.as_str()) {
                return Err(GraphError::Query(format!("constraint violated: {}", pattern)));
            }
        }
        self.log.push(Event::Run(query.to_string(), params.clone()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.log.push(Event::Commit);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.log.push(Event::Rollback);
        Ok(())
    }
}

pub async fn pool_with(connector: RecordingConnector, size: usize) -> Arc<ConnectionPool> {
    let pool = Arc::new(ConnectionPool::new(connector));
    let target = ConnectionTarget::new(
        "bolt://localhost:7687",
        Credentials::new("csauser", "csauser123"),
        "csadb01",
    );
    pool.initialize(PoolConfig::new(target).with_size(size))
        .await
        .expect("initialize pool");
    pool
}
