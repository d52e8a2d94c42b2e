#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]
use clap::Parser;
use contact_relay::adapters::database::ConnectionManager;
use contact_relay::adapters::database::memory::MemoryConnector;
use contact_relay::config::Config;
use std::sync::Once;
use tokio::sync::watch;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("contact_relay=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn get_test_config() -> Config {
    Config::try_parse_from([
        "contact-relay",
        "--database-url",
        "mongodb://localhost:27017/contact_test",
        "--host",
        "127.0.0.1",
        "--port",
        "0",
        "--environment",
        "test",
    ])
    .unwrap()
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    pub connector: MemoryConnector,
    pub connections: ConnectionManager,
    pub shutdown_tx: watch::Sender<bool>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(get_test_config(), MemoryConnector::new()).await
    }

    pub async fn spawn_with(config: Config, connector: MemoryConnector) -> Self {
        setup_tracing();

        let connections = ConnectionManager::new(connector.clone());
        let state = contact_relay::build_state(&connections, config.environment.clone());
        let app = contact_relay::api::app_router(&config, state).unwrap();

        let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.wait_for(|&s| s).await;
                })
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            config,
            connector,
            connections,
            shutdown_tx,
        }
    }

    pub async fn submit(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client.post(format!("{}/api/contact", self.base_url)).json(body).send().await.unwrap()
    }
}
