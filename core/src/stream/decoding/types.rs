use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_MAX_DEPTH, RECTYPE_KEY};
use crate::schema::SchemaError;
use crate::stream::framing::FrameError;

/// One primitive value read from a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Producer timestamp, passed through untouched.
    Time(u64),
    /// Raw `STRING` bytes, NUL padding included.
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Integer value widened to i64; `None` for floats, bytes and u64s that do not fit.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::I8(v) => Some(v as i64),
            Scalar::I16(v) => Some(v as i64),
            Scalar::I32(v) => Some(v as i64),
            Scalar::I64(v) => Some(v),
            Scalar::U8(v) => Some(v as i64),
            Scalar::U16(v) => Some(v as i64),
            Scalar::U32(v) => Some(v as i64),
            Scalar::U64(v) | Scalar::Time(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Scalar::U8(v) => Some(v as u64),
            Scalar::U16(v) => Some(v as u64),
            Scalar::U32(v) => Some(v as u64),
            Scalar::U64(v) | Scalar::Time(v) => Some(v),
            Scalar::I8(_) | Scalar::I16(_) | Scalar::I32(_) | Scalar::I64(_) => {
                self.as_i64().and_then(|v| u64::try_from(v).ok())
            }
            _ => None,
        }
    }

    /// Any numeric value as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::F32(v) => Some(v as f64),
            Scalar::F64(v) => Some(v),
            Scalar::U64(v) | Scalar::Time(v) => Some(v as f64),
            Scalar::Bytes(_) => None,
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Scalar::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::I8(v) => serializer.serialize_i8(*v),
            Scalar::I16(v) => serializer.serialize_i16(*v),
            Scalar::I32(v) => serializer.serialize_i32(*v),
            Scalar::I64(v) => serializer.serialize_i64(*v),
            Scalar::U8(v) => serializer.serialize_u8(*v),
            Scalar::U16(v) => serializer.serialize_u16(*v),
            Scalar::U32(v) => serializer.serialize_u32(*v),
            Scalar::U64(v) | Scalar::Time(v) => serializer.serialize_u64(*v),
            Scalar::F32(v) => serializer.serialize_f32(*v),
            Scalar::F64(v) => serializer.serialize_f64(*v),
            Scalar::Bytes(b) => match std::str::from_utf8(b) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => serializer.serialize_bytes(b),
            },
        }
    }
}

/// Decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Scalar>),
    Record(Box<DecodedRecord>),
    Records(Vec<DecodedRecord>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&DecodedRecord> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[DecodedRecord]> {
        match self {
            Value::Records(r) => Some(r),
            _ => None,
        }
    }

    /// Raw bytes behind a `STRING` field or an 8-bit integer scalar/array.
    ///
    /// Producers ship opaque blobs as UINT8/INT8 arrays; this recovers them
    /// for `values::get_values`.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        fn byte_of(s: &Scalar) -> Option<u8> {
            match *s {
                Scalar::U8(v) => Some(v),
                Scalar::I8(v) => Some(v as u8),
                _ => None,
            }
        }

        match self {
            Value::Scalar(Scalar::Bytes(b)) => Some(b.clone()),
            Value::Scalar(s) => byte_of(s).map(|b| vec![b]),
            Value::Array(items) => items.iter().map(byte_of).collect(),
            Value::Record(_) | Value::Records(_) => None,
        }
    }
}

/// A decoded record: its type tag plus fields in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedRecord {
    rectype: String,
    fields: Vec<(String, Value)>,
}

impl DecodedRecord {
    pub fn new(rectype: impl Into<String>) -> Self {
        Self {
            rectype: rectype.into(),
            fields: Vec::new(),
        }
    }

    pub fn rectype(&self) -> &str {
        &self.rectype
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Only the type tag is known (unregistered type or nothing decodable).
    pub fn is_stub(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// JSON object with `@rectype` first, then fields in schema order.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(RECTYPE_KEY, &self.rectype)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decoder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Deepest nesting of user types accepted before giving up.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("nesting deeper than {max_depth} while decoding {type_name}")]
    DepthExceeded { type_name: String, max_depth: usize },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
