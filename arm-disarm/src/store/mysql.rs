use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlQueryResult};
use sqlx::{Connection, Row};

use super::{Connector, Result, StatusSession};
use crate::config::DatabaseConfig;
use crate::payload::DeviceStatusRecord;
use crate::response::{Upserted, WriteOutcome};

const COUNT_DEVICE: &str = "SELECT COUNT(*) AS count FROM ArmDisarmSystem WHERE device_id = ?";
const UPDATE_DEVICE: &str =
    "UPDATE ArmDisarmSystem SET status = ?, user_id = ?, location = ? WHERE device_id = ?";
const INSERT_DEVICE: &str =
    "INSERT INTO ArmDisarmSystem (device_id, status, user_id, location) VALUES (?, ?, ?, ?)";
const LOCK_DEVICE: &str =
    "SELECT COUNT(*) AS count FROM ArmDisarmSystem WHERE device_id = ? FOR UPDATE";
const UPSERT_DEVICE: &str = "INSERT INTO ArmDisarmSystem (device_id, status, user_id, location) \
     VALUES (?, ?, ?, ?) AS new \
     ON DUPLICATE KEY UPDATE status = new.status, user_id = new.user_id, location = new.location";

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

impl MySqlConnector {
    fn options(config: &DatabaseConfig) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    type Session = MySqlSession;

    async fn connect(&self, config: &DatabaseConfig) -> Result<MySqlSession> {
        let conn = MySqlConnection::connect_with(&Self::options(config)).await?;
        Ok(MySqlSession { conn })
    }
}

pub struct MySqlSession {
    conn: MySqlConnection,
}

fn outcome(result: MySqlQueryResult) -> WriteOutcome {
    WriteOutcome {
        affected_rows: result.rows_affected(),
        insert_id: result.last_insert_id(),
    }
}

#[async_trait]
impl StatusSession for MySqlSession {
    async fn count_device(&mut self, device_id: &str) -> Result<i64> {
        let row = sqlx::query(COUNT_DEVICE)
            .bind(device_id)
            .fetch_one(&mut self.conn)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn update(&mut self, record: &DeviceStatusRecord) -> Result<WriteOutcome> {
        let result = sqlx::query(UPDATE_DEVICE)
            .bind(&record.status)
            .bind(record.user_id.as_deref())
            .bind(record.location.as_deref())
            .bind(&record.device_id)
            .execute(&mut self.conn)
            .await?;
        Ok(outcome(result))
    }

    async fn insert(&mut self, record: &DeviceStatusRecord) -> Result<WriteOutcome> {
        let result = sqlx::query(INSERT_DEVICE)
            .bind(&record.device_id)
            .bind(&record.status)
            .bind(record.user_id.as_deref())
            .bind(record.location.as_deref())
            .execute(&mut self.conn)
            .await?;
        Ok(outcome(result))
    }

    async fn upsert(&mut self, record: &DeviceStatusRecord) -> Result<(Upserted, WriteOutcome)> {
        let mut tx = self.conn.begin().await?;

        let row = sqlx::query(LOCK_DEVICE)
            .bind(&record.device_id)
            .fetch_one(&mut *tx)
            .await?;
        let count: i64 = row.try_get("count")?;

        let result = sqlx::query(UPSERT_DEVICE)
            .bind(&record.device_id)
            .bind(&record.status)
            .bind(record.user_id.as_deref())
            .bind(record.location.as_deref())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let upserted = if count > 0 {
            Upserted::Updated
        } else {
            Upserted::Inserted
        };
        Ok((upserted, outcome(result)))
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}
