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

use contact_relay::adapters::database::{ConnectionManager, MongoConnector};
use contact_relay::config::Config;
use contact_relay::telemetry::{self, LogTarget};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry, LogTarget::Stdout)?;

    contact_relay::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app_router, connections, shutdown_tx, shutdown_rx) = async {
        // Phase 1: Database, with the fixed startup retry policy
        let connections = ConnectionManager::new(MongoConnector::new(config.database.clone()));
        contact_relay::connect_with_retry(&connections, &config.startup).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        contact_relay::spawn_signal_handler(shutdown_tx.clone());

        // Phase 2: Wiring
        let state = contact_relay::build_state(&connections, config.environment.clone());
        let app_router = contact_relay::api::app_router(&config, state)?;

        // Phase 3: Listener
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(address = %addr, "listening");
        tracing::info!("Health check: http://{addr}/api/health");

        Ok::<
            (tokio::net::TcpListener, axum::Router, ConnectionManager, watch::Sender<bool>, watch::Receiver<bool>),
            anyhow::Error,
        >((listener, app_router, connections, shutdown_tx, shutdown_rx))
    }
    .instrument(boot_span)
    .await
    .inspect_err(|e| tracing::error!(error = %e, "Failed to start server"))?;

    // Phase 4: Serve until a shutdown signal arrives
    let mut server_rx = shutdown_rx.clone();
    let server = axum::serve(listener, app_router).with_graceful_shutdown(async move {
        let _ = server_rx.wait_for(|&s| s).await;
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "Server error");
    }

    // Phase 5: Close the database connection
    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(Duration::from_secs(config.server.shutdown_timeout_secs), connections.close())
        .await
        .is_err()
    {
        tracing::warn!("Timeout waiting for the database connection to close.");
    }

    telemetry_guard.shutdown();
    Ok(())
}
