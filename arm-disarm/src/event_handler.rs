use lambda_runtime::tracing::{error, info};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ConfigError, DatabaseConfig, UpsertMode};
use crate::payload::{parse_request, PayloadError, Request};
use crate::response::{Response, Upserted};
use crate::store::{Connector, StatusSession, StoreError};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Config(ConfigError::Missing(names)) => {
                error!(missing = ?names, "Required environment variables are not set");
                Response::missing_config()
            }
            HandlerError::Payload(PayloadError::MissingRequiredFields) => {
                info!("Rejecting report without device_id or status");
                Response::missing_fields()
            }
            other => {
                error!(error = %other, "Error handling device status report");
                Response::internal_error(other)
            }
        }
    }
}

/// Handles one arm/disarm report.
///
/// `config` is resolved by the caller for every invocation. The connection
/// opened here is closed before returning, whichever way the report went.
/// Failures are turned into responses, so this never returns `Err`. The event
/// is taken as raw JSON so that even a `null` event gets a structured reply.
pub async fn function_handler<C: Connector>(
    connector: &C,
    config: Result<DatabaseConfig, ConfigError>,
    event: LambdaEvent<Value>,
) -> Result<Response, Error> {
    let config = match config {
        Ok(config) => config,
        Err(err) => return Ok(HandlerError::from(err).into_response()),
    };

    let mut session = match connector.connect(&config).await {
        Ok(session) => session,
        Err(err) => return Ok(HandlerError::from(err).into_response()),
    };
    info!(host = %config.host, database = %config.database, "Connected to MySQL database");

    let result = upsert_report(&mut session, config.upsert_mode, event.payload).await;

    match session.close().await {
        Ok(()) => info!("Connection closed"),
        Err(err) => error!(error = %err, "Failed to close connection"),
    }

    Ok(result.unwrap_or_else(HandlerError::into_response))
}

async fn upsert_report<S: StatusSession>(
    session: &mut S,
    mode: UpsertMode,
    event: Value,
) -> Result<Response, HandlerError> {
    let record = parse_request(Request::from_event(event)?)?;

    let (upserted, results) = match mode {
        UpsertMode::CheckThenWrite => {
            if session.count_device(&record.device_id).await? > 0 {
                info!(device_id = %record.device_id, "Updating existing record");
                (Upserted::Updated, session.update(&record).await?)
            } else {
                info!(device_id = %record.device_id, "Inserting new record");
                (Upserted::Inserted, session.insert(&record).await?)
            }
        }
        UpsertMode::Atomic => {
            info!(device_id = %record.device_id, "Upserting record");
            session.upsert(&record).await?
        }
    };

    info!(
        device_id = %record.device_id,
        affected_rows = results.affected_rows,
        insert_id = results.insert_id,
        "{}",
        upserted.message()
    );
    Ok(Response::success(upserted, results))
}
