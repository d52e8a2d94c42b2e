use crate::adapters::database::{ConnectionManager, ConnectionState};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub database: Option<ConnectionState>,
    pub timestamp: OffsetDateTime,
    pub environment: Option<String>,
}

/// Reports the process and database state. Never fails and never blocks on the
/// database: it only reads the observed connection state.
#[derive(Clone, Debug)]
pub struct HealthService {
    connections: ConnectionManager,
    environment: Option<String>,
}

impl HealthService {
    #[must_use]
    pub const fn new(connections: ConnectionManager, environment: Option<String>) -> Self {
        Self { connections, environment }
    }

    #[must_use]
    pub fn report(&self) -> HealthReport {
        HealthReport {
            database: self.connections.state(),
            timestamp: OffsetDateTime::now_utc(),
            environment: self.environment.clone(),
        }
    }
}
