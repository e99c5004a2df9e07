//! Schema-less payloads: keyboards and tracking data.
//!
//! The platform treats keyboards and tracking data as opaque JSON. They are
//! carried as a [`Document`] (a JSON object) so that the rest of the SDK keeps
//! static types, while the contents stay free-form until the send boundary
//! validates them.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

/// A JSON object with no fixed schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Adds a key (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Converts any JSON value into a document.
    ///
    /// Returns `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Consumes the document, returning the underlying JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Encodes the document the way tracking data travels on the wire.
    pub fn to_tracking_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Decodes tracking data received from the platform.
    ///
    /// Empty input yields an empty document. Input that is not a JSON object
    /// is kept verbatim under the `"raw"` key.
    pub fn from_tracking_string(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::new();
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self(map),
            _ => {
                debug!(len = raw.len(), "Tracking data is not a JSON object");
                Self::new().with("raw", raw)
            }
        }
    }

    /// Checks the minimal keyboard shape: a `Buttons` array.
    pub fn is_keyboard(&self) -> bool {
        matches!(self.0.get("Buttons"), Some(Value::Array(_)))
    }
}

impl Deref for Document {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Serde adapter for tracking data: a document on our side, a JSON string on
/// the wire.
pub mod tracking_data {
    use super::*;

    pub fn serialize<S>(value: &Option<Document>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(doc) => serializer.serialize_str(&doc.to_tracking_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Document>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(Document::from_tracking_string(&s)),
            Some(Value::Object(map)) => Some(Document(map)),
            Some(other) => Some(Document::new().with("raw", other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tracking_string_round_trip() {
        let doc = Document::new().with("step", 2).with("flow", "signup");
        let wire = doc.to_tracking_string();
        assert!(wire.starts_with('{'));
        assert_eq!(Document::from_tracking_string(&wire), doc);
    }

    #[test]
    fn test_non_object_tracking_kept_raw() {
        let doc = Document::from_tracking_string("session-42");
        assert_eq!(doc.get("raw"), Some(&json!("session-42")));
        assert!(Document::from_tracking_string("  ").is_empty());
    }

    #[test]
    fn test_keyboard_shape() {
        let keyboard = Document::from_value(json!({
            "Type": "keyboard",
            "Buttons": [{"ActionType": "reply", "ActionBody": "yes", "Text": "Yes"}]
        }))
        .unwrap();
        assert!(keyboard.is_keyboard());
        assert!(!Document::new().with("Buttons", "nope").is_keyboard());
        assert!(Document::from_value(json!([1, 2])).is_none());
    }
}
