use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry in the notification feed.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl NotificationMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            time: None,
        }
    }

    /// Decode a pushed payload.
    ///
    /// JSON objects with a `text` (or `message`) field are read structurally
    /// and a JSON string becomes the text. Anything else, including invalid
    /// JSON, is kept verbatim as the text.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::from_object(&map).unwrap_or_else(|| Self::new(raw)),
            Ok(Value::String(text)) => Self::new(text),
            _ => Self::new(raw),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Option<Self> {
        let text = map
            .get("text")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)?;

        Some(Self {
            id: map.get("id").and_then(scalar_string),
            text: text.to_string(),
            time: map.get("time").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// A locally generated message stamped with `now`.
    pub(crate) fn simulated(text: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Some(now.timestamp_millis().to_string()),
            text: text.to_string(),
            time: Some(now.with_timezone(&Local).format("%H:%M:%S").to_string()),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
