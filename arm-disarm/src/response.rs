use serde::Serialize;
use serde_json::json;

pub const UPDATED: &str = "Record updated successfully";
pub const INSERTED: &str = "Record inserted successfully";
pub const REQUIRED_FIELDS: &str = "device_id and status are required fields.";
pub const MISSING_CONFIG: &str = "Required environment variables are not set";
pub const GENERIC_ERROR: &str = "An error occurred";

/// Gateway-style response: a status code and a JSON encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Metadata of the write statement, echoed back as `results`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub affected_rows: u64,
    pub insert_id: u64,
}

/// Which branch of the upsert ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

impl Upserted {
    pub fn message(self) -> &'static str {
        match self {
            Upserted::Inserted => INSERTED,
            Upserted::Updated => UPDATED,
        }
    }
}

impl Response {
    fn new(status_code: u16, body: serde_json::Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    pub fn success(upserted: Upserted, results: WriteOutcome) -> Self {
        Self::new(200, json!({ "message": upserted.message(), "results": results }))
    }

    pub fn missing_fields() -> Self {
        Self::new(400, json!({ "message": REQUIRED_FIELDS }))
    }

    pub fn missing_config() -> Self {
        Self::new(500, json!({ "message": MISSING_CONFIG }))
    }

    pub fn internal_error(error: impl std::fmt::Display) -> Self {
        Self::new(
            500,
            json!({ "message": GENERIC_ERROR, "error": error.to_string() }),
        )
    }
}
