//! Connection pool implementation

use std::collections::{HashSet, VecDeque};
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use graphpool_core::{GraphConnection, GraphConnector};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Semaphore, TryAcquireError};

use super::config::PoolConfig;
use super::handle::{ConnectionHandle, HandleId};
use super::stats::PoolStats;
use crate::{PoolError, PoolResult};

/// Where the pool is in its one-way lifecycle
enum Lifecycle {
    Uninitialized,
    Running(Arc<PoolState>),
    Closed,
}

/// Handles waiting in the pool and ids of handles lent out.
///
/// Both live under one lock so `available + held` never drifts from the
/// pool size, not even transiently.
struct Slots {
    available: VecDeque<ConnectionHandle>,
    held: HashSet<HandleId>,
    /// Set by `drain`; a handle checked in afterwards is already closed
    closed: bool,
}

/// Every connection the pool opened, kept for shutdown
struct RosterEntry {
    id: HandleId,
    connection: Arc<dyn GraphConnection>,
}

impl RosterEntry {
    fn of(handle: &ConnectionHandle) -> Self {
        Self {
            id: handle.id(),
            connection: handle.connection().clone(),
        }
    }
}

/// State of an initialized pool
pub(super) struct PoolState {
    config: PoolConfig,
    database: Arc<str>,
    slots: Mutex<Slots>,
    /// One permit per available handle
    permits: Semaphore,
    roster: Mutex<Vec<RosterEntry>>,
}

impl PoolState {
    fn new(config: PoolConfig, database: Arc<str>, handles: Vec<ConnectionHandle>) -> Self {
        let roster = handles.iter().map(RosterEntry::of).collect();
        let permits = Semaphore::new(handles.len());
        Self {
            config,
            database,
            slots: Mutex::new(Slots {
                available: handles.into(),
                held: HashSet::new(),
                closed: false,
            }),
            permits,
            roster: Mutex::new(roster),
        }
    }

    /// Move one handle from `available` to `held`; the caller holds a permit
    fn checkout(&self) -> Option<ConnectionHandle> {
        let mut slots = self.slots.lock();
        let handle = slots.available.pop_front()?;
        slots.held.insert(handle.id());
        Some(handle)
    }

    /// Move a held handle back to `available` and wake one waiter
    ///
    /// A release that read the pool as running but lost the race with
    /// `shutdown` lands here after `drain`; the handle is dropped.
    pub(super) fn checkin(&self, handle: ConnectionHandle) -> PoolResult<()> {
        {
            let mut slots = self.slots.lock();
            if slots.closed {
                tracing::debug!(handle = %handle.id(), "release during shutdown ignored");
                return Ok(());
            }
            if !slots.held.remove(&handle.id()) {
                return Err(PoolError::DoubleRelease(handle.id()));
            }
            slots.available.push_back(handle);
        }
        // Permit added after the push: permits never exceed available handles
        self.permits.add_permits(1);
        Ok(())
    }

    fn stats(&self, waiting: usize) -> PoolStats {
        let slots = self.slots.lock();
        PoolStats::new(
            self.config.size(),
            slots.available.len(),
            slots.held.len(),
            waiting,
        )
    }

    #[cfg(test)]
    pub(super) fn roster_len(&self) -> usize {
        self.roster.lock().len()
    }

    /// Empty the slots and hand back the roster. Returns the roster and how
    /// many handles were still lent out.
    fn drain(&self) -> (Vec<RosterEntry>, usize) {
        let held = {
            let mut slots = self.slots.lock();
            slots.closed = true;
            slots.available.clear();
            let held = slots.held.len();
            slots.held.clear();
            held
        };
        (std::mem::take(&mut *self.roster.lock()), held)
    }
}

/// Outcome of `ConnectionPool::shutdown`
#[derive(Debug, Default)]
pub struct ShutdownReport {
    closed: usize,
    failures: Vec<PoolError>,
}

impl ShutdownReport {
    /// Number of connections closed without error
    pub fn closed(&self) -> usize {
        self.closed
    }

    /// `PoolError::CloseFailure` for every connection that failed to close
    pub fn failures(&self) -> &[PoolError] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Close every connection, carrying on past failures
async fn close_connections(entries: Vec<RosterEntry>) -> ShutdownReport {
    let mut report = ShutdownReport::default();
    for entry in entries {
        match entry.connection.close().await {
            Ok(()) => report.closed += 1,
            Err(source) => {
                tracing::warn!(handle = %entry.id, error = %source, "failed to close connection");
                report.failures.push(PoolError::CloseFailure {
                    handle: entry.id,
                    source,
                });
            }
        }
    }
    report
}

/// Keeps the waiting count right even if an acquire future is dropped
struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Connections opened so far by an `initialize` in progress
///
/// If `initialize` is dropped before the pool takes the handles, the
/// connections are closed on a background task.
struct Opening {
    handles: Vec<ConnectionHandle>,
}

impl Opening {
    fn new(size: usize) -> Self {
        Self {
            handles: Vec::with_capacity(size),
        }
    }

    fn push(&mut self, handle: ConnectionHandle) {
        self.handles.push(handle);
    }

    fn take_roster(&mut self) -> Vec<RosterEntry> {
        self.handles.drain(..).map(|handle| RosterEntry::of(&handle)).collect()
    }

    fn into_handles(mut self) -> Vec<ConnectionHandle> {
        std::mem::take(&mut self.handles)
    }
}

impl Drop for Opening {
    fn drop(&mut self) {
        let opened = self.take_roster();
        if opened.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::warn!(
                    opened = opened.len(),
                    "initialize cancelled, closing opened connections"
                );
                runtime.spawn(close_connections(opened));
            }
            Err(_) => {
                tracing::warn!(
                    opened = opened.len(),
                    "initialize cancelled outside a runtime, connections dropped"
                );
            }
        }
    }
}

/// A fixed-size pool of graph database connections
///
/// The pool is built once per process by the application's composition
/// root and shared by `Arc`. `initialize` opens every connection up front;
/// `acquire`/`release` lend them out one caller at a time; `shutdown` closes
/// them all and is terminal.
pub struct ConnectionPool {
    /// Opens the underlying connections
    connector: Arc<dyn GraphConnector>,
    lifecycle: RwLock<Lifecycle>,
    /// Serializes initialize and shutdown
    transition: tokio::sync::Mutex<()>,
    /// Number of callers blocked in `acquire`
    waiting: AtomicUsize,
}

impl ConnectionPool {
    /// Create an uninitialized pool that opens connections through `connector`
    pub fn new<C: GraphConnector>(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
            transition: tokio::sync::Mutex::new(()),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Name of the driver behind this pool
    pub fn driver_name(&self) -> &'static str {
        self.connector.name()
    }

    /// Open `config.size()` connections and start lending them out
    ///
    /// Calling this again with an identical configuration is a no-op; a
    /// different configuration fails with `ConfigurationConflict`. If any
    /// connection fails to open, the ones already opened are closed and the
    /// pool stays uninitialized.
    #[tracing::instrument(skip(self, config), fields(endpoint = %config.target().endpoint, database = %config.database(), size = config.size()))]
    pub async fn initialize(&self, config: PoolConfig) -> PoolResult<()> {
        config.validate()?;
        let _transition = self.transition.lock().await;
        if self.already_initialized(&config)? {
            return Ok(());
        }

        let database: Arc<str> = Arc::from(config.database());
        let size = config.size();
        let mut opening = Opening::new(size);
        for attempt in 1..=size {
            match self.connector.connect(config.target()).await {
                Ok(connection) => {
                    opening.push(ConnectionHandle::new(connection, database.clone()));
                }
                Err(source) => {
                    tracing::error!(attempt, error = %source, "failed to open pooled connection");
                    close_connections(opening.take_roster()).await;
                    return Err(PoolError::InitializationFailure {
                        attempt,
                        size,
                        source,
                    });
                }
            }
        }

        let state = PoolState::new(config, database, opening.into_handles());
        *self.lifecycle.write() = Lifecycle::Running(Arc::new(state));
        tracing::info!(driver = self.connector.name(), "connection pool initialized");
        Ok(())
    }

    fn already_initialized(&self, config: &PoolConfig) -> PoolResult<bool> {
        match &*self.lifecycle.read() {
            Lifecycle::Uninitialized => Ok(false),
            Lifecycle::Running(state) if state.config == *config => {
                tracing::debug!("pool already initialized with this configuration");
                Ok(true)
            }
            Lifecycle::Running(_) => Err(PoolError::ConfigurationConflict),
            Lifecycle::Closed => Err(PoolError::PoolClosed),
        }
    }

    pub(super) fn running_state(&self) -> PoolResult<Arc<PoolState>> {
        match &*self.lifecycle.read() {
            Lifecycle::Running(state) => Ok(state.clone()),
            Lifecycle::Uninitialized => Err(PoolError::NotInitialized),
            Lifecycle::Closed => Err(PoolError::PoolClosed),
        }
    }

    /// Take a handle out of the pool, waiting up to `timeout` for one
    ///
    /// A zero timeout makes a single attempt without waiting. Fails with
    /// `PoolExhausted` when the timeout elapses and with `PoolClosed` once
    /// the pool has been shut down, including for callers already waiting.
    /// Dropping the returned future before it completes takes nothing.
    pub async fn acquire(&self, timeout: Duration) -> PoolResult<ConnectionHandle> {
        let state = self.running_state()?;

        let permit = if timeout.is_zero() {
            match state.permits.try_acquire() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => {
                    return Err(PoolError::PoolExhausted { timeout });
                }
                Err(TryAcquireError::Closed) => return Err(PoolError::PoolClosed),
            }
        } else {
            let _waiting = WaitingGuard::new(&self.waiting);
            match tokio::time::timeout(timeout, state.permits.acquire()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(PoolError::PoolClosed),
                Err(_) => {
                    tracing::debug!(?timeout, "timed out waiting for connection");
                    return Err(PoolError::PoolExhausted { timeout });
                }
            }
        };

        // The permit now belongs to the handle; `release` adds it back
        permit.forget();
        let handle = state.checkout().ok_or(PoolError::PoolClosed)?;
        tracing::debug!(handle = %handle.id(), "connection acquired");
        Ok(handle)
    }

    /// Put a handle back into the pool
    ///
    /// Never waits. Wakes at most one caller blocked in `acquire`. Releasing
    /// after shutdown is a no-op since shutdown already closed the
    /// connection. A handle this pool has not lent out is rejected with
    /// `DoubleRelease`.
    pub fn release(&self, handle: ConnectionHandle) -> PoolResult<()> {
        let id = handle.id();
        let state = match self.running_state() {
            Ok(state) => state,
            Err(PoolError::PoolClosed) => {
                tracing::debug!(handle = %id, "release after shutdown ignored");
                return Ok(());
            }
            Err(_) => return Err(PoolError::DoubleRelease(id)),
        };
        state.checkin(handle)?;
        tracing::debug!(handle = %id, "connection released");
        Ok(())
    }

    /// Acquire with the configured acquire timeout, returning a guard that
    /// releases the handle when dropped
    pub async fn get(&self) -> PoolResult<PooledConnection<'_>> {
        let timeout = self.running_state()?.config.acquire_timeout();
        self.get_timeout(timeout).await
    }

    /// Acquire with an explicit timeout, returning a guard that releases the
    /// handle when dropped
    pub async fn get_timeout(&self, timeout: Duration) -> PoolResult<PooledConnection<'_>> {
        let handle = self.acquire(timeout).await?;
        Ok(PooledConnection {
            handle: Some(handle),
            pool: self,
        })
    }

    /// Get the database every handle is bound to
    pub fn database(&self) -> PoolResult<Arc<str>> {
        self.running_state().map(|state| state.database.clone())
    }

    /// Get the configuration the pool was initialized with
    pub fn config(&self) -> Option<PoolConfig> {
        self.running_state().ok().map(|state| state.config.clone())
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let waiting = self.waiting.load(Ordering::SeqCst);
        match self.running_state() {
            Ok(state) => state.stats(waiting),
            Err(_) => PoolStats::new(0, 0, 0, waiting),
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(&*self.lifecycle.read(), Lifecycle::Running(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(&*self.lifecycle.read(), Lifecycle::Closed)
    }

    /// Number of connections the pool will close on shutdown
    #[cfg(test)]
    pub(super) fn roster_len(&self) -> usize {
        match self.running_state() {
            Ok(state) => state.roster_len(),
            Err(_) => 0,
        }
    }

    /// Close every connection the pool opened and stop lending
    ///
    /// Connections still held by callers are closed in place. A connection
    /// that fails to close is logged and reported, and the rest are still
    /// closed. Calling this again returns an empty report.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) -> ShutdownReport {
        let _transition = self.transition.lock().await;
        let previous = std::mem::replace(&mut *self.lifecycle.write(), Lifecycle::Closed);
        let state = match previous {
            Lifecycle::Running(state) => state,
            Lifecycle::Uninitialized => {
                tracing::debug!("pool closed before initialization");
                return ShutdownReport::default();
            }
            Lifecycle::Closed => {
                tracing::debug!("pool already shut down");
                return ShutdownReport::default();
            }
        };

        state.permits.close();
        let (roster, held) = state.drain();
        if held > 0 {
            tracing::warn!(held, "closing connections still held by callers");
        }

        let report = close_connections(roster).await;
        tracing::info!(
            closed = report.closed(),
            failed = report.failures().len(),
            "connection pool shut down"
        );
        report
    }
}

/// A connection handle borrowed from the pool
///
/// When dropped, the handle is automatically returned to the pool, on every
/// exit path of the scope that holds it.
pub struct PooledConnection<'a> {
    handle: Option<ConnectionHandle>,
    pool: &'a ConnectionPool,
}

impl Deref for PooledConnection<'_> {
    type Target = ConnectionHandle;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref().expect("handle taken")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.pool.release(handle) {
                tracing::warn!(error = %e, "failed to return connection to pool");
            }
        }
    }
}
