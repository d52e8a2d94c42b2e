use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Deployment environment label reported by the health endpoint
    #[arg(long, env = "CONTACT_ENVIRONMENT")]
    pub environment: Option<String>,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub cors: CorsConfig,

    #[command(flatten)]
    pub startup: StartupConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// MongoDB connection string
    #[arg(long = "database-url", env = "CONTACT_DATABASE_URL")]
    pub url: String,

    /// Database used when the connection string does not name one
    #[arg(long = "database-name", env = "CONTACT_DATABASE_NAME", default_value = "contact")]
    pub name: String,

    /// Collection that receives submissions
    #[arg(long = "database-collection", env = "CONTACT_DATABASE_COLLECTION", default_value = "contacts")]
    pub collection: String,

    /// How long to wait for a usable server before failing an operation
    #[arg(long, env = "CONTACT_DATABASE_SERVER_SELECTION_TIMEOUT_MS", default_value_t = 5000)]
    pub server_selection_timeout_ms: u64,

    /// Timeout for opening a single socket to the server
    #[arg(long, env = "CONTACT_DATABASE_CONNECT_TIMEOUT_MS", default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    /// Upper bound on a single write before it is reported as failed
    #[arg(long, env = "CONTACT_DATABASE_WRITE_TIMEOUT_MS", default_value_t = 45_000)]
    pub write_timeout_ms: u64,

    /// Maximum number of pooled connections
    #[arg(long, env = "CONTACT_DATABASE_MAX_POOL_SIZE", default_value_t = 10)]
    pub max_pool_size: u32,

    /// Minimum number of pooled connections kept open
    #[arg(long, env = "CONTACT_DATABASE_MIN_POOL_SIZE", default_value_t = 1)]
    pub min_pool_size: u32,

    /// Idle time after which a pooled connection is closed
    #[arg(long, env = "CONTACT_DATABASE_MAX_IDLE_TIME_MS", default_value_t = 30_000)]
    pub max_idle_time_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "CONTACT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CONTACT_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Seconds to wait for the database connection to close on shutdown
    #[arg(long, env = "CONTACT_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "CONTACT_BODY_LIMIT_BYTES", default_value_t = 10_240)]
    pub body_limit_bytes: usize,
}

#[derive(Clone, Debug, Args)]
pub struct CorsConfig {
    /// Origin allowed to call the API with credentials
    #[arg(long, env = "CONTACT_ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,

    /// Allow any origin (credentials are not allowed in this mode)
    #[arg(long, env = "CONTACT_CORS_ANY_ORIGIN", default_value_t = false)]
    pub any_origin: bool,
}

#[derive(Clone, Debug, Args)]
pub struct StartupConfig {
    /// Number of connection attempts made before the server gives up
    #[arg(long = "startup-max-attempts", env = "CONTACT_STARTUP_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Fixed delay between startup connection attempts
    #[arg(long = "startup-retry-delay-secs", env = "CONTACT_STARTUP_RETRY_DELAY_SECS", default_value_t = 5)]
    pub retry_delay_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "CONTACT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces, metrics and logs are exported when set
    #[arg(long, env = "CONTACT_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
