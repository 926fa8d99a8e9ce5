pub mod config;
pub mod event_handler;
pub mod payload;
pub mod response;
pub mod store;

pub use config::{ConfigError, DatabaseConfig, UpsertMode, DB_PORT};
pub use event_handler::function_handler;
pub use payload::{DeviceStatusRecord, Request};
pub use response::{Response, WriteOutcome};
pub use store::{Connector, MySqlConnector, StatusSession};
