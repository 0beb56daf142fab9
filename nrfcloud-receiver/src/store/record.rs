//! Record written for each device message.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::payload::Message;

/// Document fields stored for one device message.
///
/// `payload` holds the message payload serialized back to a JSON string the
/// way a JavaScript producer would write it: key order preserved and whole
/// floats written as integers. Fields absent from the message are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl StoredRecord {
    pub fn from_message(message: &Message) -> Result<Self, serde_json::Error> {
        let payload = message
            .payload
            .as_ref()
            .map(|p| serde_json::to_string(&integral_floats(p)))
            .transpose()?;

        Ok(StoredRecord {
            device_id: message.device_id.clone(),
            app_id: message.app_id.clone(),
            timestamp: message.ts.clone(),
            payload,
        })
    }
}

/// Largest integer a JavaScript number holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Rewrite floats with no fractional part (`21.0`, `1e3`) as integers.
fn integral_floats(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
                Value::Number(Number::from(f as i64))
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(integral_floats).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), integral_floats(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}
