//! Persistence of device status reports.
//!
//! The handler talks to the backing table through two seams: a [`Connector`]
//! that opens one session per invocation, and the [`StatusSession`] it
//! returns. [`MySqlConnector`] is the production implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::payload::DeviceStatusRecord;
use crate::response::{Upserted, WriteOutcome};

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod mysql;

pub use mysql::{MySqlConnector, MySqlSession};

pub const TABLE: &str = "ArmDisarmSystem";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Sql(#[from] sqlx::Error),
    #[error("{0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait Connector: Send + Sync {
    type Session: StatusSession;

    /// Opens a dedicated connection for a single invocation.
    async fn connect(&self, config: &DatabaseConfig) -> Result<Self::Session>;
}

/// One open connection to the status table.
#[async_trait]
pub trait StatusSession: Send {
    /// Number of rows stored for `device_id`.
    async fn count_device(&mut self, device_id: &str) -> Result<i64>;

    async fn update(&mut self, record: &DeviceStatusRecord) -> Result<WriteOutcome>;

    async fn insert(&mut self, record: &DeviceStatusRecord) -> Result<WriteOutcome>;

    /// Insert-or-update keyed on `device_id` in one transaction. The branch
    /// comes from a locking read of the key, not from the affected-row count,
    /// which depends on how the server counts unchanged rows.
    async fn upsert(&mut self, record: &DeviceStatusRecord) -> Result<(Upserted, WriteOutcome)>;

    /// Releases the connection. Consumes the session so it cannot be closed twice.
    async fn close(self) -> Result<()>;
}
