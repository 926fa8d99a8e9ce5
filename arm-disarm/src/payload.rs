use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
    #[error("device_id and status are required fields.")]
    MissingRequiredFields,
    #[error("cannot read body of a null event")]
    NullEvent,
}

/// Invocation event. Only `body` is read; any other gateway fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub body: Option<RequestBody>,
}

impl Request {
    /// Reads the invocation event. A `null` event has no body to read and is
    /// an error; any other non-object event simply has no body.
    pub fn from_event(event: Value) -> Result<Self, PayloadError> {
        match event {
            Value::Null => Err(PayloadError::NullEvent),
            object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
            _ => Ok(Self::default()),
        }
    }
}

/// API Gateway forwards the body as a JSON string, direct invocations may
/// pass the object itself.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Encoded(String),
    Object(Value),
}

impl RequestBody {
    pub fn decode(self) -> Result<Value, PayloadError> {
        match self {
            RequestBody::Encoded(raw) => Ok(serde_json::from_str(&raw)?),
            RequestBody::Object(value) => Ok(value),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReportPayload {
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

/// One row of `ArmDisarmSystem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatusRecord {
    pub device_id: String,
    pub status: String,
    pub user_id: Option<String>,
    pub location: Option<String>,
}

impl DeviceStatusRecord {
    pub fn new(device_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            status: status.into(),
            user_id: None,
            location: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Validates a decoded body against the report schema.
    ///
    /// Anything that is not a JSON object carries no fields and is rejected
    /// as missing them. Fields of the wrong JSON type are a decode error.
    pub fn from_body(body: Option<Value>) -> Result<Self, PayloadError> {
        let payload: ReportPayload = match body {
            Some(object @ Value::Object(_)) => serde_json::from_value(object)?,
            _ => return Err(PayloadError::MissingRequiredFields),
        };

        match (non_empty(payload.device_id), non_empty(payload.status)) {
            (Some(device_id), Some(status)) => Ok(Self {
                device_id,
                status,
                user_id: non_empty(payload.user_id),
                location: non_empty(payload.location),
            }),
            _ => Err(PayloadError::MissingRequiredFields),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Decodes the request body (if any) and validates it into a record.
pub fn parse_request(request: Request) -> Result<DeviceStatusRecord, PayloadError> {
    let body = request.body.map(RequestBody::decode).transpose()?;
    DeviceStatusRecord::from_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(event: Value) -> Request {
        Request::from_event(event).unwrap()
    }

    #[test]
    fn string_body_is_decoded() {
        let record = parse_request(request(json!({
            "body": "{\"device_id\":\"dev1\",\"status\":\"armed\"}"
        })))
        .unwrap();
        assert_eq!(record, DeviceStatusRecord::new("dev1", "armed"));
    }

    #[test]
    fn object_body_is_used_as_is() {
        let record = parse_request(request(json!({
            "body": {
                "device_id": "dev1",
                "status": "disarmed",
                "user_id": "u1",
                "location": "home"
            }
        })))
        .unwrap();
        assert_eq!(
            record,
            DeviceStatusRecord::new("dev1", "disarmed")
                .with_user_id("u1")
                .with_location("home")
        );
    }

    #[test]
    fn gateway_fields_next_to_body_are_ignored() {
        let record = parse_request(request(json!({
            "httpMethod": "POST",
            "headers": { "content-type": "application/json" },
            "body": "{\"device_id\":\"dev9\",\"status\":\"armed\",\"extra\":true}"
        })))
        .unwrap();
        assert_eq!(record.device_id, "dev9");
    }

    #[test]
    fn malformed_string_is_a_decode_error() {
        let err = parse_request(request(json!({ "body": "{not json" }))).unwrap_err();
        assert!(matches!(err, PayloadError::Decode(_)));
    }

    #[test]
    fn wrongly_typed_field_is_a_decode_error() {
        let err = parse_request(request(json!({
            "body": { "device_id": "dev1", "status": "armed", "user_id": 42 }
        })))
        .unwrap_err();
        assert!(matches!(err, PayloadError::Decode(_)));
    }

    #[test]
    fn missing_or_empty_required_fields_are_rejected() {
        for body in [
            json!({ "device_id": "dev2" }),
            json!({ "status": "armed" }),
            json!({}),
            json!({ "device_id": "", "status": "armed" }),
            json!({ "device_id": "dev2", "status": "" }),
            json!({ "device_id": null, "status": "armed" }),
        ] {
            let err = parse_request(request(json!({ "body": body }))).unwrap_err();
            assert!(matches!(err, PayloadError::MissingRequiredFields), "{body}");
        }
    }

    #[test]
    fn absent_null_and_non_object_bodies_are_rejected() {
        for event in [
            json!({}),
            json!({ "body": null }),
            json!({ "body": "null" }),
            json!({ "body": "\"dev1\"" }),
            json!({ "body": 17 }),
            json!({ "body": ["dev1", "armed"] }),
        ] {
            let err = parse_request(request(event.clone())).unwrap_err();
            assert!(matches!(err, PayloadError::MissingRequiredFields), "{event}");
        }
    }

    #[test]
    fn null_event_cannot_be_read() {
        assert!(matches!(
            Request::from_event(Value::Null),
            Err(PayloadError::NullEvent)
        ));
    }

    #[test]
    fn non_object_event_has_no_body() {
        for event in [json!(5), json!("dev1"), json!([1, 2])] {
            let err = parse_request(request(event.clone())).unwrap_err();
            assert!(matches!(err, PayloadError::MissingRequiredFields), "{event}");
        }
    }

    #[test]
    fn empty_optional_fields_become_none() {
        let record = parse_request(request(json!({
            "body": { "device_id": "dev1", "status": "armed", "user_id": "", "location": null }
        })))
        .unwrap();
        assert_eq!(record.user_id, None);
        assert_eq!(record.location, None);
    }
}
