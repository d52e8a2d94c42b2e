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

//! Function runtime adapter: one JSON invocation per stdin line, one JSON response per
//! stdout line. The database connection is established lazily by the first submission
//! and shared by every later invocation handled by this process.

use contact_relay::adapters::database::{ConnectionManager, MongoConnector};
use contact_relay::api::function;
use contact_relay::config::Config;
use contact_relay::telemetry::{self, LogTarget};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry, LogTarget::Stderr)?;

    contact_relay::setup_panic_hook();

    let connections = ConnectionManager::new(MongoConnector::new(config.database.clone()));
    let state = contact_relay::build_state(&connections, config.environment.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = function::invoke(&state.contact_service, &line).await;
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    connections.close().await;
    telemetry_guard.shutdown();
    Ok(())
}
