//! The typed-value JSON encoding Firestore's REST API uses for document
//! fields, e.g. `{"stringValue": "him"}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

pub type Fields = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    // int64s travel as strings
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    // base64
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    MapValue(MapValue),
    ArrayValue(ArrayValue),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    pub update_time: Option<String>,
}

impl Document {
    /// The trailing path segment of the document's resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::StringValue(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::StringValue(s)
    }
}

impl From<&HashMap<String, bool>> for Value {
    fn from(map: &HashMap<String, bool>) -> Self {
        Value::MapValue(MapValue {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), Value::BooleanValue(*v)))
                .collect(),
        })
    }
}

pub fn string<'f>(fields: &'f Fields, key: &str) -> Result<&'f str, String> {
    match fields.get(key) {
        Some(Value::StringValue(s)) => Ok(s),
        Some(other) => Err(format!("field \"{key}\" isn't a string: {other:?}")),
        None => Err(format!("missing field \"{key}\"")),
    }
}

pub fn timestamp(fields: &Fields, key: &str) -> Result<Timestamp, String> {
    match fields.get(key) {
        Some(Value::TimestampValue(s)) => {
            Timestamp::from_server(s).map_err(|e| format!("field \"{key}\": {e}"))
        }
        Some(other) => Err(format!("field \"{key}\" isn't a timestamp: {other:?}")),
        None => Err(format!("missing field \"{key}\"")),
    }
}

/// A map of booleans. Non-boolean entries are dropped.
pub fn bool_map(fields: &Fields, key: &str) -> Result<HashMap<String, bool>, String> {
    match fields.get(key) {
        Some(Value::MapValue(map)) => Ok(map
            .fields
            .iter()
            .filter_map(|(k, v)| match v {
                Value::BooleanValue(b) => Some((k.clone(), *b)),
                _ => None,
            })
            .collect()),
        Some(other) => Err(format!("field \"{key}\" isn't a map: {other:?}")),
        // an unwritten map is an empty one
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_a_document() {
        let doc: Document = serde_json::from_str(
            r#"{
                "name": "projects/p/databases/(default)/documents/progress/abc123",
                "fields": {
                    "userId": { "stringValue": "u1" },
                    "topicProgress": {
                        "mapValue": {
                            "fields": {
                                "Waves-SHM": { "booleanValue": true },
                                "Waves-Resonance": { "booleanValue": false }
                            }
                        }
                    },
                    "updatedAt": { "timestampValue": "2024-03-01T12:00:00.5Z" }
                },
                "createTime": "2024-03-01T12:00:00.5Z",
                "updateTime": "2024-03-01T12:00:00.5Z"
            }"#,
        )
        .unwrap();

        assert_eq!(doc.id(), "abc123");
        assert_eq!(string(&doc.fields, "userId").unwrap(), "u1");

        let progress = bool_map(&doc.fields, "topicProgress").unwrap();
        assert_eq!(progress.len(), 2);
        assert!(progress["Waves-SHM"]);

        let when = timestamp(&doc.fields, "updatedAt").unwrap();
        assert_eq!(
            when,
            Timestamp::from(::time::macros::datetime!(2024-03-01 12:00:00.5 UTC))
        );
    }

    #[test]
    fn decodes_every_value_kind() {
        let fields: Fields = serde_json::from_str(
            r#"{
                "photo": { "referenceValue": "projects/p/databases/(default)/documents/photos/1" },
                "avatarPng": { "bytesValue": "iVBORw0K" },
                "home": { "geoPointValue": { "latitude": 51.5, "longitude": -0.12 } },
                "tags": { "arrayValue": { "values": [{ "integerValue": "3" }, { "nullValue": null }] } }
            }"#,
        )
        .unwrap();

        assert_eq!(
            fields["home"],
            Value::GeoPointValue(LatLng {
                latitude: 51.5,
                longitude: -0.12
            })
        );
        assert!(matches!(fields["photo"], Value::ReferenceValue(_)));
        assert!(string(&fields, "avatarPng").is_err());
    }

    #[test]
    fn empty_map_values_have_no_fields_key() {
        let v: Value = serde_json::from_str(r#"{ "mapValue": {} }"#).unwrap();

        assert_eq!(v, Value::MapValue(MapValue::default()));
    }

    #[test]
    fn wrong_types_are_reported() {
        let mut fields = Fields::new();
        fields.insert("date".into(), Value::BooleanValue(true));

        assert!(string(&fields, "date").is_err());
        assert!(string(&fields, "missing").is_err());
    }

    #[test]
    fn encodes_tagged() {
        let json = serde_json::to_value(Value::from("her")).unwrap();

        assert_eq!(json, serde_json::json!({ "stringValue": "her" }));
    }
}
