pub mod connection;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod mongo;
pub mod records;

pub use connection::{
    Connection, ConnectionFailure, ConnectionManager, ConnectionState, ConnectionStatus, Connector, PersistenceError,
    SubmissionRepository,
};
pub use mongo::MongoConnector;
