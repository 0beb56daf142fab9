//! nRF Cloud webhook payload types.
//!
//! nRF Cloud posts untyped JSON. A body is either the one-off endpoint
//! verification handshake, a batch of device messages, or something this
//! receiver has no use for.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Value of the `event` field on the verification handshake.
pub const VERIFICATION_EVENT: &str = "verification";

/// A classified webhook body.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    /// Endpoint ownership handshake.
    Verification(VerificationPayload),
    /// Non-empty batch of device messages.
    Telemetry(TelemetryPayload),
    /// Anything else, including an empty or missing `messages` array.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationPayload {
    /// Handshake token; absent tokens are tolerated and logged as such
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPayload {
    /// Raw message entries, in delivery order
    pub messages: Vec<Value>,
}

/// A single device message inside a telemetry batch.
///
/// Every field is optional: nRF Cloud does not guarantee them and a missing
/// field is simply left out of the stored record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    /// Device identifier
    #[serde(default)]
    pub device_id: Option<String>,
    /// Application id of the message (e.g. "TEMP", "GNSS")
    #[serde(default, rename = "appId")]
    pub app_id: Option<String>,
    /// ISO-8601 timestamp assigned by nRF Cloud
    #[serde(default)]
    pub ts: Option<String>,
    /// Application payload, arbitrary JSON. `Some(Value::Null)` for an
    /// explicit `null`, `None` only when the key is absent.
    #[serde(default, deserialize_with = "present")]
    pub payload: Option<Value>,
}

/// Wrap any value that is present, `null` included.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Message {
    /// Parse one entry of a telemetry batch.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Message::deserialize(value)
    }

    /// Device id used in log lines.
    pub fn device_label(&self) -> &str {
        self.device_id.as_deref().unwrap_or("unknown")
    }
}

/// Parse a verified raw body and classify it.
///
/// Only malformed JSON is an error; any well-formed document that is neither
/// a handshake nor a non-empty batch classifies as `Unrecognized`.
pub fn classify(body: &[u8]) -> Result<WebhookPayload, serde_json::Error> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(classify_value(value))
}

fn classify_value(value: Value) -> WebhookPayload {
    if value.get("event").and_then(Value::as_str) == Some(VERIFICATION_EVENT) {
        let token = value
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string);
        return WebhookPayload::Verification(VerificationPayload { token });
    }

    match value {
        Value::Object(mut map) => match map.remove("messages") {
            Some(Value::Array(messages)) if !messages.is_empty() => {
                WebhookPayload::Telemetry(TelemetryPayload { messages })
            }
            _ => WebhookPayload::Unrecognized,
        },
        _ => WebhookPayload::Unrecognized,
    }
}
