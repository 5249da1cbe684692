//! Interpretation of decoded QR text as device information.
//!
//! Modules carry either a structured JSON object
//! (`{"device_id": "SENSOR_001", "type": "temperature_sensor"}`) or a bare
//! identifier (`MODULE_001`).

use serde_json::{Map, Value};

/// Key under which bare identifiers are stored
pub const DEVICE_ID_KEY: &str = "device_id";

/// Parse decoded text into a device-info object.
///
/// A JSON object is returned as is; anything else, including JSON scalars
/// and arrays, becomes `{"device_id": text}`.
pub fn parse_device_info(data: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert(DEVICE_ID_KEY.to_string(), Value::String(data.to_string()));
            map
        }
    }
}

/// The `device_id` entry rendered as text
pub fn device_id(info: &Map<String, Value>) -> Option<String> {
    info.get(DEVICE_ID_KEY).map(value_to_text)
}

/// Render a JSON value for tables: strings unquoted, everything else as JSON
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
