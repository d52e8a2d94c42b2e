#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::database::{ConnectionFailure, ConnectionManager};
use crate::api::AppState;
use crate::config::StartupConfig;
use crate::services::contact_service::ContactService;
use crate::services::health_service::HealthService;
use backon::{ConstantBuilder, Retryable};
use std::time::Duration;
use tokio::sync::watch;

/// Wires the services that share a single connection manager.
#[must_use]
pub fn build_state(connections: &ConnectionManager, environment: Option<String>) -> AppState {
    AppState {
        contact_service: ContactService::new(connections.clone()),
        health_service: HealthService::new(connections.clone(), environment),
    }
}

/// Establishes the database connection before the server starts accepting traffic,
/// retrying with a fixed delay. This is a startup-only policy: once serving, an
/// unavailable database yields `503` responses instead.
///
/// # Errors
/// Returns the last `ConnectionFailure` once every attempt has failed.
pub async fn connect_with_retry(
    connections: &ConnectionManager,
    policy: &StartupConfig,
) -> Result<(), ConnectionFailure> {
    let max_attempts = policy.max_attempts.max(1);
    let strategy = ConstantBuilder::default()
        .with_delay(Duration::from_secs(policy.retry_delay_secs))
        .with_max_times(usize::try_from(max_attempts - 1).unwrap_or(usize::MAX));

    (|| async { connections.acquire().await.map(|_| ()) })
        .retry(strategy)
        .notify(|e, delay| {
            tracing::warn!(error = %e, retry_in = ?delay, "Database connection failed, retrying");
        })
        .await
        .inspect_err(|e| tracing::error!(error = %e, attempts = max_attempts, "Max connection attempts reached"))
}

/// Logs panics through `tracing` so they reach the configured log pipeline.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(%location, %payload, "Panic occurred");
        default_hook(info);
    }));
}

/// Flips `shutdown_tx` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received, shutting down gracefully");
        let _ = shutdown_tx.send(true);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::memory::MemoryConnector;

    #[tokio::test]
    async fn test_startup_retry_recovers() {
        let connector = MemoryConnector::new().failing(2);
        let connections = ConnectionManager::new(connector.clone());
        let policy = StartupConfig { max_attempts: 3, retry_delay_secs: 0 };

        connect_with_retry(&connections, &policy).await.unwrap();

        assert_eq!(connector.attempts(), 3);
    }

    #[tokio::test]
    async fn test_startup_retry_gives_up() {
        let connector = MemoryConnector::new().failing(5);
        let connections = ConnectionManager::new(connector.clone());
        let policy = StartupConfig { max_attempts: 3, retry_delay_secs: 0 };

        assert!(connect_with_retry(&connections, &policy).await.is_err());
        assert_eq!(connector.attempts(), 3);
    }
}
