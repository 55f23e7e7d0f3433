//! schema/parse.rs
//!
//! Definition documents as served by the producer's `definition` endpoint:
//!
//! ```text
//! { "@datasize": 8,
//!   "x": { "type": "INT32", "offset": 0,  "elements": 1, "flags": "LE" },
//!   "y": { "type": "INT32", "offset": 32, "elements": 1, "flags": "LE" } }
//! ```
//!
//! Keys carrying the meta marker are retained as schema metadata; every other key is a field.
//! Field order follows the document (serde_json is built with `preserve_order`).

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::constants::{DATASIZE_KEY, META_MARKER};
use crate::schema::registry::SchemaFetcher;
use crate::schema::types::{FieldDefinition, FieldFlags, RecordSchema, SchemaError};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlagsDoc {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct FieldDoc {
    #[serde(rename = "type")]
    type_name: String,
    offset: i64,
    #[serde(default = "default_elements")]
    elements: i64,
    #[serde(default)]
    flags: Option<FlagsDoc>,
}

fn default_elements() -> i64 {
    1
}

impl FlagsDoc {
    fn to_flags(&self) -> FieldFlags {
        match self {
            FlagsDoc::Text(s) => FieldFlags::from_tokens([s.as_str()]),
            FlagsDoc::List(v) => FieldFlags::from_tokens(v.iter().map(String::as_str)),
        }
    }
}

impl RecordSchema {
    /// Build a schema from a parsed definition document.
    pub fn from_json(type_name: &str, doc: &Value) -> Result<RecordSchema, SchemaError> {
        let entries = doc.as_object().ok_or_else(|| SchemaError::Malformed {
            type_name: type_name.to_string(),
            reason: "definition is not a JSON object".into(),
        })?;

        let mut datasize = 0usize;
        let mut meta = Vec::new();
        let mut fields = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            if key.contains(META_MARKER) {
                if key == DATASIZE_KEY {
                    datasize = parse_datasize(type_name, value)?;
                }
                meta.push((key.clone(), value.clone()));
                continue;
            }

            let field: FieldDoc = serde_json::from_value(value.clone()).map_err(|e| {
                SchemaError::InvalidField {
                    type_name: type_name.to_string(),
                    field: key.clone(),
                    reason: e.to_string(),
                }
            })?;

            if field.offset < 0 {
                return Err(SchemaError::InvalidField {
                    type_name: type_name.to_string(),
                    field: key.clone(),
                    reason: format!("negative offset {}", field.offset),
                });
            }

            let flags = field.flags.as_ref().map(FlagsDoc::to_flags).unwrap_or_default();
            fields.push(FieldDefinition::new(
                key.clone(),
                field.type_name,
                field.offset as u64,
                field.elements,
                flags,
            ));
        }

        let mut schema = RecordSchema::new(type_name, datasize, fields)?;
        for (key, value) in meta {
            schema = schema.with_meta(key, value);
        }
        Ok(schema)
    }

    /// Parse a definition document from its JSON text.
    pub fn from_json_str(type_name: &str, text: &str) -> Result<RecordSchema, SchemaError> {
        let doc: Value = serde_json::from_str(text)?;
        RecordSchema::from_json(type_name, &doc)
    }
}

fn parse_datasize(type_name: &str, value: &Value) -> Result<usize, SchemaError> {
    let malformed = || SchemaError::Malformed {
        type_name: type_name.to_string(),
        reason: format!("{} must be a non-negative integer, got {}", DATASIZE_KEY, value),
    };

    if let Some(n) = value.as_u64() {
        return Ok(n as usize);
    }
    // Some producers report sizes as whole floats.
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as usize),
        _ => Err(malformed()),
    }
}

/// Fetch collaborator backed by definition documents held in memory.
///
/// Useful for replaying captured streams offline and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    docs: HashMap<String, Value>,
}

impl StaticSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document of the form `{ "<type name>": <definition>, ... }`.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let doc: HashMap<String, Value> = serde_json::from_str(text)?;
        Ok(Self { docs: doc })
    }

    pub fn insert(&mut self, type_name: impl Into<String>, definition: Value) {
        self.docs.insert(type_name.into(), definition);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.docs.contains_key(type_name)
    }
}

impl SchemaFetcher for StaticSchemaSource {
    fn fetch_schema(&self, type_name: &str) -> Result<RecordSchema, SchemaError> {
        let doc = self
            .docs
            .get(type_name)
            .ok_or_else(|| SchemaError::not_found(type_name))?;
        RecordSchema::from_json(type_name, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_fields_in_document_order() {
        let schema = RecordSchema::from_json(
            "PT",
            &json!({
                "y": { "type": "INT32", "offset": 32, "elements": 1, "flags": "LE" },
                "@datasize": 8,
                "x": { "type": "INT32", "offset": 0, "elements": 1, "flags": "LE" }
            }),
        )
        .unwrap();

        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["y", "x"]);
        assert_eq!(schema.datasize(), 8);
        assert_eq!(schema.meta(DATASIZE_KEY), Some(&json!(8)));
    }

    #[test]
    fn flag_list_and_expression_forms() {
        let schema = RecordSchema::from_json(
            "F",
            &json!({
                "a": { "type": "UINT64", "offset": 0, "elements": 1, "flags": ["LE", "PTR"] },
                "b": { "type": "UINT16", "offset": 64, "elements": 1, "flags": "BE|PTR" },
                "c": { "type": "UINT16", "offset": 80, "elements": 1 }
            }),
        )
        .unwrap();

        assert_eq!(schema.field("a").unwrap().flags, FieldFlags::LE | FieldFlags::PTR);
        assert_eq!(schema.field("b").unwrap().flags, FieldFlags::BE | FieldFlags::PTR);
        assert!(schema.field("c").unwrap().flags.is_empty());
    }

    #[test]
    fn negative_offset_is_rejected() {
        let err = RecordSchema::from_json(
            "N",
            &json!({ "a": { "type": "INT8", "offset": -8, "elements": 1 } }),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField { .. }));
    }

    #[test]
    fn non_object_document_is_malformed() {
        let err = RecordSchema::from_json("N", &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }
}
