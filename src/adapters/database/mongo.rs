use crate::adapters::database::connection::{
    BoxError, Connection, ConnectionState, ConnectionStatus, Connector, PersistenceError, SubmissionRepository,
};
use crate::adapters::database::records::SubmissionRecord;
use crate::config::DatabaseConfig;
use crate::domain::submission::Submission;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
pub struct MongoConnector {
    config: DatabaseConfig,
}

impl MongoConnector {
    #[must_use]
    pub const fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    async fn client_options(&self, status: &ConnectionStatus) -> mongodb::error::Result<ClientOptions> {
        let mut options = ClientOptions::parse(&self.config.url).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_selection_timeout = Some(Duration::from_millis(self.config.server_selection_timeout_ms));
        options.connect_timeout = Some(Duration::from_millis(self.config.connect_timeout_ms));
        options.max_pool_size = Some(self.config.max_pool_size);
        options.min_pool_size = Some(self.config.min_pool_size);
        options.max_idle_time = Some(Duration::from_millis(self.config.max_idle_time_ms));
        options.sdam_event_handler = Some(lifecycle_handler(status.clone()));
        Ok(options)
    }
}

#[async_trait]
impl Connector for MongoConnector {
    #[tracing::instrument(level = "debug", skip_all, err(level = "warn"))]
    async fn connect(&self, status: &ConnectionStatus) -> Result<Connection, BoxError> {
        let options = self.client_options(status).await?;
        let client = Client::with_options(options)?;
        let database = client.default_database().unwrap_or_else(|| client.database(&self.config.name));

        // Client construction is lazy; a ping proves the deployment is reachable.
        database.run_command(doc! { "ping": 1 }).await?;
        tracing::info!(database = %database.name(), "Connected to MongoDB");

        let collection = database.collection::<SubmissionRecord>(&self.config.collection);
        Ok(Arc::new(MongoSubmissionRepository {
            client,
            collection,
            write_timeout: Duration::from_millis(self.config.write_timeout_ms),
        }))
    }
}

/// Driver lifecycle notifications are logged and mirrored into the observable state.
/// Readiness follows the whole topology, so one unreachable replica set member does not
/// mark the deployment down while a primary still accepts writes. The cached connection
/// itself is never touched.
fn lifecycle_handler(status: ConnectionStatus) -> EventHandler<SdamEvent> {
    EventHandler::callback(move |event: SdamEvent| match event {
        SdamEvent::TopologyDescriptionChanged(event) => {
            apply_writability(&status, event.new_description.has_writable_server());
        }
        SdamEvent::ServerHeartbeatFailed(event) => {
            tracing::debug!(server = %event.server_address, error = %event.failure, "MongoDB heartbeat failed");
        }
        SdamEvent::TopologyClosed(_) => {
            tracing::info!("MongoDB topology closed");
        }
        _ => {}
    })
}

/// Only flips between `Connected` and `Disconnected`; an attempt in flight or a shutdown
/// in progress owns the state until it settles.
fn apply_writability(status: &ConnectionStatus, writable: bool) {
    if writable {
        if status.transition(ConnectionState::Disconnected, ConnectionState::Connected) {
            tracing::info!("MongoDB writable again");
        }
    } else if status.transition(ConnectionState::Connected, ConnectionState::Disconnected) {
        tracing::warn!("MongoDB has no writable server");
    }
}

#[derive(Debug)]
pub struct MongoSubmissionRepository {
    client: Client,
    collection: Collection<SubmissionRecord>,
    write_timeout: Duration,
}

#[async_trait]
impl SubmissionRepository for MongoSubmissionRepository {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn insert(&self, submission: &Submission) -> Result<(), PersistenceError> {
        let record = SubmissionRecord::from(submission);

        match timeout(self.write_timeout, self.collection.insert_one(&record).into_future()).await {
            Ok(Ok(result)) => {
                tracing::debug!(id = %result.inserted_id, "Submission stored");
                Ok(())
            }
            Ok(Err(e)) => Err(PersistenceError::Write(Box::new(e))),
            Err(_) => Err(PersistenceError::TimedOut(self.write_timeout)),
        }
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
    }
}
