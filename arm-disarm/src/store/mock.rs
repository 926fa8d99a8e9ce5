//! In-memory status table for exercising the handler without MySQL.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Connector, Result, StatusSession, StoreError, TABLE};
use crate::config::DatabaseConfig;
use crate::payload::DeviceStatusRecord;
use crate::response::{Upserted, WriteOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Connect,
    Count,
    Write,
    Close,
}

#[derive(Default)]
struct MockState {
    rows: BTreeMap<String, DeviceStatusRecord>,
    fail_at: Option<FailurePoint>,
    connects: usize,
    closes: usize,
    writes: usize,
}

impl MockState {
    fn check(&self, point: FailurePoint) -> Result<()> {
        if self.fail_at == Some(point) {
            return Err(StoreError::Backend(format!("injected {point:?} failure")));
        }
        Ok(())
    }
}

/// Cloned connectors share the same table and counters.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_at(&self, point: Option<FailurePoint>) {
        self.state.lock().await.fail_at = point;
    }

    pub async fn seed(&self, record: DeviceStatusRecord) {
        self.state
            .lock()
            .await
            .rows
            .insert(record.device_id.clone(), record);
    }

    pub async fn row(&self, device_id: &str) -> Option<DeviceStatusRecord> {
        self.state.lock().await.rows.get(device_id).cloned()
    }

    pub async fn row_count(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn connects(&self) -> usize {
        self.state.lock().await.connects
    }

    pub async fn closes(&self) -> usize {
        self.state.lock().await.closes
    }

    /// Number of UPDATE/INSERT/upsert statements that reached the table.
    pub async fn writes(&self) -> usize {
        self.state.lock().await.writes
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, _config: &DatabaseConfig) -> Result<MockSession> {
        let mut state = self.state.lock().await;
        state.check(FailurePoint::Connect)?;
        state.connects += 1;
        Ok(MockSession {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl StatusSession for MockSession {
    async fn count_device(&mut self, device_id: &str) -> Result<i64> {
        let state = self.state.lock().await;
        state.check(FailurePoint::Count)?;
        Ok(state.rows.contains_key(device_id) as i64)
    }

    async fn update(&mut self, record: &DeviceStatusRecord) -> Result<WriteOutcome> {
        let mut state = self.state.lock().await;
        state.check(FailurePoint::Write)?;
        state.writes += 1;
        let affected_rows = match state.rows.get_mut(&record.device_id) {
            Some(row) => {
                *row = record.clone();
                1
            }
            None => 0,
        };
        Ok(WriteOutcome {
            affected_rows,
            insert_id: 0,
        })
    }

    async fn insert(&mut self, record: &DeviceStatusRecord) -> Result<WriteOutcome> {
        let mut state = self.state.lock().await;
        state.check(FailurePoint::Write)?;
        state.writes += 1;
        if state.rows.contains_key(&record.device_id) {
            return Err(StoreError::Backend(format!(
                "Duplicate entry '{}' for key '{TABLE}.PRIMARY'",
                record.device_id
            )));
        }
        state.rows.insert(record.device_id.clone(), record.clone());
        Ok(WriteOutcome {
            affected_rows: 1,
            insert_id: 0,
        })
    }

    async fn upsert(&mut self, record: &DeviceStatusRecord) -> Result<(Upserted, WriteOutcome)> {
        let mut state = self.state.lock().await;
        state.check(FailurePoint::Write)?;
        state.writes += 1;
        // The server counts found rows, so an unchanged duplicate reports 1.
        let (upserted, affected_rows) =
            match state.rows.insert(record.device_id.clone(), record.clone()) {
                None => (Upserted::Inserted, 1),
                Some(previous) if previous == *record => (Upserted::Updated, 1),
                Some(_) => (Upserted::Updated, 2),
            };
        Ok((
            upserted,
            WriteOutcome {
                affected_rows,
                insert_id: 0,
            },
        ))
    }

    async fn close(self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.closes += 1;
        state.check(FailurePoint::Close)
    }
}
