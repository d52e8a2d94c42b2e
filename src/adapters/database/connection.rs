use crate::domain::submission::Submission;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A live handle to the submission store.
pub type Connection = Arc<dyn SubmissionRepository>;

/// Establishment of a database session failed. Cheap to clone so that every caller
/// waiting on the same attempt receives the same failure.
#[derive(Error, Debug, Clone)]
#[error("database connection failed: {source}")]
pub struct ConnectionFailure {
    #[source]
    source: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl ConnectionFailure {
    #[must_use]
    pub fn new(source: BoxError) -> Self {
        Self { source: Arc::from(source) }
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("write failed: {0}")]
    Write(#[source] BoxError),
    #[error("write timed out after {0:?}")]
    TimedOut(Duration),
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync + fmt::Debug {
    /// Stores one submission as a new document.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the write fails or exceeds its timeout.
    async fn insert(&self, submission: &Submission) -> Result<(), PersistenceError>;

    /// Closes the underlying session.
    async fn shutdown(&self);
}

#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Opens and verifies a new session. Driver lifecycle notifications may be reported
    /// through `status`.
    ///
    /// # Errors
    /// Returns the underlying transport or authentication error.
    async fn connect(&self, status: &ConnectionStatus) -> Result<Connection, BoxError>;
}

/// Observable connection state. The discriminants follow the conventional driver
/// ready-state numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connected = 1,
    Connecting = 2,
    Disconnecting = 3,
}

impl ConnectionState {
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connected),
            2 => Some(Self::Connecting),
            3 => Some(Self::Disconnecting),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Disconnecting => "disconnecting",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConnectionStatus(Arc<AtomicU8>);

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self(Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)))
    }
}

impl ConnectionStatus {
    /// Returns `None` when the stored code is not one of the known states.
    #[must_use]
    pub fn current(&self) -> Option<ConnectionState> {
        ConnectionState::from_code(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Moves to `to` only if the current state is `from`.
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.0.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }
}

#[derive(Clone, Debug)]
struct Metrics {
    connection_attempts_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("contact-relay");
        Self {
            connection_attempts_total: meter
                .u64_counter("database_connection_attempts_total")
                .with_description("Database connection attempts by result")
                .build(),
        }
    }
}

type PendingAttempt = Shared<BoxFuture<'static, Result<Connection, ConnectionFailure>>>;

struct Inner {
    connector: Box<dyn Connector>,
    connection: OnceLock<Connection>,
    pending: Mutex<Option<PendingAttempt>>,
    status: ConnectionStatus,
    metrics: Metrics,
}

/// Process-wide, lazily established database connection.
///
/// At most one connection attempt is in flight at any time. Callers arriving while an
/// attempt is running wait on that same attempt and observe its outcome. A failed attempt
/// leaves nothing cached, so the next `acquire` starts over. Once established, the
/// connection is read without taking the lock.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connector", &self.inner.connector)
            .field("state", &self.inner.status.current())
            .field("established", &self.inner.connection.get().is_some())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    #[must_use]
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Box::new(connector),
                connection: OnceLock::new(),
                pending: Mutex::new(None),
                status: ConnectionStatus::default(),
                metrics: Metrics::new(),
            }),
        }
    }

    /// Returns the cached connection, joining or starting an attempt if needed.
    ///
    /// # Errors
    /// Returns `ConnectionFailure` if the attempt this call waited on failed.
    pub async fn acquire(&self) -> Result<Connection, ConnectionFailure> {
        if let Some(connection) = self.inner.connection.get() {
            return Ok(Arc::clone(connection));
        }

        let attempt = {
            let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);

            // An attempt may have settled between the fast path and taking the lock.
            if let Some(connection) = self.inner.connection.get() {
                return Ok(Arc::clone(connection));
            }

            match pending.as_ref() {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = Self::start_attempt(Arc::clone(&self.inner));
                    *pending = Some(attempt.clone());
                    attempt
                }
            }
        };

        attempt.await
    }

    #[must_use]
    pub fn state(&self) -> Option<ConnectionState> {
        self.inner.status.current()
    }

    /// Shuts down the established connection, if any.
    pub async fn close(&self) {
        let Some(connection) = self.inner.connection.get() else {
            return;
        };

        self.inner.status.set(ConnectionState::Disconnecting);
        connection.shutdown().await;
        self.inner.status.set(ConnectionState::Disconnected);
        tracing::info!("Database connection closed");
    }

    /// Must be called with `pending` locked, so `settle` cannot run before the attempt is
    /// recorded there.
    fn start_attempt(inner: Arc<Inner>) -> PendingAttempt {
        inner.status.set(ConnectionState::Connecting);
        tracing::info!("Connecting to database");

        // The attempt runs on its own task so it completes even if every waiter is dropped.
        let task = tokio::spawn({
            let inner = Arc::clone(&inner);
            async move {
                let result = inner.connector.connect(&inner.status).await.map_err(ConnectionFailure::new);
                inner.settle(&result);
                result
            }
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    let result = Err(ConnectionFailure::new(Box::new(e)));
                    inner.settle(&result);
                    result
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    fn settle(&self, result: &Result<Connection, ConnectionFailure>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        match result {
            Ok(connection) => {
                // Only the single in-flight attempt ever reaches this point.
                let _ = self.connection.set(Arc::clone(connection));
                self.status.set(ConnectionState::Connected);
                self.metrics.connection_attempts_total.add(1, &[KeyValue::new("result", "success")]);
                tracing::info!("Database connection established");
            }
            Err(e) => {
                self.status.set(ConnectionState::Disconnected);
                self.metrics.connection_attempts_total.add(1, &[KeyValue::new("result", "failure")]);
                tracing::error!(error = %e, "Database connection attempt failed");
            }
        }

        *pending = None;
    }
}
