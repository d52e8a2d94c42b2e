use crate::adapters::database::{ConnectionManager, ConnectionState};
use crate::domain::submission::{ContactForm, Submission};
use crate::error::{AppError, Result};
use axum::http::Method;
use opentelemetry::{KeyValue, global, metrics::Counter};
use time::OffsetDateTime;

#[derive(Clone, Debug)]
struct Metrics {
    submissions_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("contact-relay");
        Self {
            submissions_total: meter
                .u64_counter("contact_submissions_total")
                .with_description("Contact form submissions by outcome")
                .build(),
        }
    }

    fn record(&self, outcome: &'static str) {
        self.submissions_total.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

/// Validates contact submissions and stores them through the shared connection.
///
/// Every entry point (HTTP route, function invocation) goes through this type, so the
/// precondition order lives in one place: method, required fields, email shape, then
/// database readiness.
#[derive(Clone, Debug)]
pub struct ContactService {
    connections: ConnectionManager,
    metrics: Metrics,
}

impl ContactService {
    #[must_use]
    pub fn new(connections: ConnectionManager) -> Self {
        Self { connections, metrics: Metrics::new() }
    }

    /// Only `POST` creates submissions.
    ///
    /// # Errors
    /// Returns `AppError::MethodNotAllowed` for any other method.
    pub fn ensure_method(method: &Method) -> Result<()> {
        if *method == Method::POST { Ok(()) } else { Err(AppError::MethodNotAllowed(method.to_string())) }
    }

    /// Validates the form and persists exactly one record for it.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for missing fields or a malformed email,
    /// `AppError::ConnectionFailed`/`AppError::DatabaseNotReady` if no usable connection
    /// exists, and `AppError::Persistence` if the write itself fails.
    #[tracing::instrument(skip_all, err(level = "debug"))]
    pub async fn submit(&self, form: ContactForm) -> Result<Submission> {
        let result = self.try_submit(form).await;
        self.metrics.record(match &result {
            Ok(_) => "created",
            Err(AppError::Validation(_)) => "rejected",
            Err(AppError::ConnectionFailed(_) | AppError::DatabaseNotReady(_)) => "unavailable",
            Err(_) => "failed",
        });
        result
    }

    async fn try_submit(&self, form: ContactForm) -> Result<Submission> {
        let submission = Submission::from_form(form, OffsetDateTime::now_utc())?;

        let connection = self.connections.acquire().await?;
        let state = self.connections.state();
        if state != Some(ConnectionState::Connected) {
            return Err(AppError::DatabaseNotReady(state));
        }

        connection.insert(&submission).await?;
        tracing::info!("Contact form submitted");

        Ok(submission)
    }
}
