//! In-memory stand-ins for the MongoDB adapter, used by this crate's tests and, through the
//! `test-util` feature, by integration tests.

use crate::adapters::database::connection::{
    BoxError, Connection, ConnectionState, ConnectionStatus, Connector, PersistenceError, SubmissionRepository,
};
use crate::domain::submission::Submission;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// In-process submission store. Every successful connect hands out the same repository,
/// so submissions written through any connection are visible through `repository()`.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    submissions: Mutex<Vec<Submission>>,
    fail_writes: AtomicBool,
    shut_down: AtomicBool,
}

impl MemoryRepository {
    #[must_use]
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionRepository for MemoryRepository {
    async fn insert(&self, submission: &Submission) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Write(Box::new(std::io::Error::other("write rejected by store"))));
        }

        self.submissions.lock().unwrap_or_else(PoisonError::into_inner).push(submission.clone());
        Ok(())
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

/// Connector backed by a `MemoryRepository`, with knobs for latency and failing attempts.
#[derive(Clone, Debug, Default)]
pub struct MemoryConnector {
    repository: Arc<MemoryRepository>,
    attempts: Arc<AtomicUsize>,
    failures_remaining: Arc<AtomicUsize>,
    latency: Duration,
    status: Arc<Mutex<Option<ConnectionStatus>>>,
}

impl MemoryConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every connect by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the next `count` connect attempts fail.
    #[must_use]
    pub fn failing(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn repository(&self) -> Arc<MemoryRepository> {
        Arc::clone(&self.repository)
    }

    /// Reports a lifecycle change through the status handed to the last connect, the way
    /// driver topology events do. Does nothing before the first connect.
    pub fn report_state(&self, state: ConnectionState) {
        if let Some(status) = self.status.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            status.set(state);
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, status: &ConnectionStatus) -> Result<Connection, BoxError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = Some(status.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| remaining.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Box::new(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused")));
        }

        Ok(Arc::clone(&self.repository) as Connection)
    }
}
