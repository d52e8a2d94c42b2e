use crate::adapters::database::{ConnectionFailure, ConnectionState, PersistenceError};
use crate::api::schemas::contact::ContactResponse;
use crate::domain::submission::ValidationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error(transparent)]
    ConnectionFailed(#[from] ConnectionFailure),
    #[error("Database not ready: {}", .0.map_or("unknown", ConnectionState::as_str))]
    DatabaseNotReady(Option<ConnectionState>),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::ConnectionFailed(_) | Self::DatabaseNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// The message shown to clients. Server-side detail never appears here.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::MethodNotAllowed(_) => "Method Not Allowed".to_string(),
            Self::ConnectionFailed(_) | Self::DatabaseNotReady(_) => "Database connection unavailable".to_string(),
            Self::Persistence(_) => "Server error. Please try again later.".to_string(),
            Self::NotFound => "Endpoint not found".to_string(),
        }
    }

    /// Logs the error with full detail at a level matching its severity.
    pub fn report(&self) {
        match self {
            Self::Validation(e) => tracing::debug!(reason = %e, "Rejected submission"),
            Self::MethodNotAllowed(method) => tracing::debug!(%method, "Method not allowed"),
            Self::ConnectionFailed(e) => tracing::error!(error = %e, "Database connection unavailable"),
            Self::DatabaseNotReady(state) => {
                tracing::warn!(state = state.map_or("unknown", ConnectionState::as_str), "Database not ready");
            }
            Self::Persistence(e) => tracing::error!(error = %e, "Failed to store submission"),
            Self::NotFound => tracing::debug!("Endpoint not found"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (self.status_code(), Json(ContactResponse::failure(self.public_message()))).into_response()
    }
}
