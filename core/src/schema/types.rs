//! schema/types.rs
//! Primitive type table and record layout descriptions.
//!
//! Layout notes:
//! - Offsets are expressed in bits, as the producer reports them; they are byte aligned in practice.
//! - `elements == 1` is a scalar, `> 1` a fixed array, `<= 0` consumes the rest of the payload.
//! - A rest-of-buffer field must be the last decodable field of its schema. Fields placed after it
//!   would overlap the bytes it already claimed.

use std::collections::HashSet;
use std::fmt;
use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::constants::{flag_tokens, primitive_names, META_MARKER};

/// Wire layout of a primitive value.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum PrimitiveKind {
    Int8     = 0x01,
    Int16    = 0x02,
    Int32    = 0x03,
    Int64    = 0x04,
    UInt8    = 0x05,
    UInt16   = 0x06,
    UInt32   = 0x07,
    UInt64   = 0x08,
    BitField = 0x09,
    Float    = 0x0A,
    Double   = 0x0B,
    Time8    = 0x0C,
    String   = 0x0D,
}

/// One row of the primitive type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveType {
    pub name: &'static str,
    pub kind: PrimitiveKind,
    /// Width of one element on the wire, in bytes.
    pub size: usize,
}

impl PrimitiveType {
    const fn new(name: &'static str, kind: PrimitiveKind, size: usize) -> Self {
        Self { name, kind, size }
    }

    /// Look up a primitive by the name used in definition documents.
    pub fn lookup(name: &str) -> Option<&'static PrimitiveType> {
        PRIMITIVE_TYPES.iter().find(|p| p.name == name)
    }

    /// Bit fields are declared by producers but carry no decodable width.
    pub fn is_supported(&self) -> bool {
        self.kind != PrimitiveKind::BitField && self.size > 0
    }
}

/// Compiled-in primitive type table.
pub static PRIMITIVE_TYPES: [PrimitiveType; 13] = [
    PrimitiveType::new(primitive_names::INT8,     PrimitiveKind::Int8,     1),
    PrimitiveType::new(primitive_names::INT16,    PrimitiveKind::Int16,    2),
    PrimitiveType::new(primitive_names::INT32,    PrimitiveKind::Int32,    4),
    PrimitiveType::new(primitive_names::INT64,    PrimitiveKind::Int64,    8),
    PrimitiveType::new(primitive_names::UINT8,    PrimitiveKind::UInt8,    1),
    PrimitiveType::new(primitive_names::UINT16,   PrimitiveKind::UInt16,   2),
    PrimitiveType::new(primitive_names::UINT32,   PrimitiveKind::UInt32,   4),
    PrimitiveType::new(primitive_names::UINT64,   PrimitiveKind::UInt64,   8),
    PrimitiveType::new(primitive_names::BITFIELD, PrimitiveKind::BitField, 0),
    PrimitiveType::new(primitive_names::FLOAT,    PrimitiveKind::Float,    4),
    PrimitiveType::new(primitive_names::DOUBLE,   PrimitiveKind::Double,   8),
    PrimitiveType::new(primitive_names::TIME8,    PrimitiveKind::Time8,    8),
    PrimitiveType::new(primitive_names::STRING,   PrimitiveKind::String,   1),
];

bitflags::bitflags! {
    /// Per-field flags as declared by the producer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u8 {
        /// Multi-byte values are little-endian
        const LE  = 0b0000_0001;

        /// Multi-byte values are big-endian
        const BE  = 0b0000_0010;

        /// Value is an address in the producer's memory; never decoded
        const PTR = 0b0000_0100;
    }
}

impl FieldFlags {
    /// Parse a flag expression such as `"LE"`, `"BE|PTR"` or `"LE, PTR"`.
    /// Unknown tokens are ignored.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut flags = FieldFlags::empty();
        for token in tokens {
            for part in token.split(|c: char| c == '|' || c == ',' || c.is_whitespace()) {
                match part.trim() {
                    flag_tokens::LITTLE_ENDIAN => flags |= FieldFlags::LE,
                    flag_tokens::BIG_ENDIAN    => flags |= FieldFlags::BE,
                    flag_tokens::POINTER       => flags |= FieldFlags::PTR,
                    _ => {}
                }
            }
        }
        flags
    }

    /// Little-endian when `LE` is present, big-endian otherwise.
    pub fn endianness(&self) -> Endianness {
        if self.contains(FieldFlags::LE) {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// One field of a record layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    /// Primitive name or the name of another registered schema.
    pub type_name: String,
    /// Offset from the start of the payload, in bits.
    pub offset: u64,
    pub elements: i64,
    pub flags: FieldFlags,
}

impl FieldDefinition {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        offset: u64,
        elements: i64,
        flags: FieldFlags,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            offset,
            elements,
            flags,
        }
    }

    /// Offset in bytes (bit offset floored to a byte boundary).
    pub fn byte_offset(&self) -> usize {
        (self.offset / 8) as usize
    }

    pub fn is_meta(&self) -> bool {
        self.name.contains(META_MARKER)
    }

    pub fn is_pointer(&self) -> bool {
        self.flags.contains(FieldFlags::PTR)
    }

    /// Element count is computed from the bytes left after `offset`.
    pub fn is_rest_of_buffer(&self) -> bool {
        self.elements <= 0
    }

    /// Everything but an explicit count of one decodes to a sequence.
    pub fn is_array(&self) -> bool {
        self.elements != 1
    }
}

/// Immutable layout of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    type_name: String,
    fields: Vec<FieldDefinition>,
    datasize: usize,
    meta: Vec<(String, serde_json::Value)>,
}

impl RecordSchema {
    /// Build a schema from fields in declaration order.
    ///
    /// `datasize` is the producer's authoritative encoded size (`@datasize`); it is only
    /// consulted when this type is nested inside another as an array element.
    pub fn new(
        type_name: impl Into<String>,
        datasize: usize,
        fields: Vec<FieldDefinition>,
    ) -> Result<Self, SchemaError> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(SchemaError::Malformed {
                type_name,
                reason: "empty type name".into(),
            });
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_name,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self {
            type_name,
            fields,
            datasize,
            meta: Vec::new(),
        })
    }

    /// Attach a meta entry retained from the definition document.
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.push((key.into(), value));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fields in declaration order, meta-named entries included.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Fields the decoder will visit: meta and pointer fields filtered out.
    pub fn decodable_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| !f.is_meta() && !f.is_pointer())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn datasize(&self) -> usize {
        self.datasize
    }

    pub fn meta(&self, key: &str) -> Option<&serde_json::Value> {
        self.meta.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Produce a concise debug summary of the schema
    pub fn summary(&self) -> String {
        format!(
            "RecordSchema {{ type: {}, fields: {}, datasize: {}, meta: {} }}",
            self.type_name,
            self.fields.len(),
            self.datasize,
            self.meta.len(),
        )
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.type_name, self.datasize)?;
        for field in &self.fields {
            write!(
                f,
                "\n  {}: {} @{} x{} {:?}",
                field.name, field.type_name, field.offset, field.elements, field.flags
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    /// The fetch collaborator could not produce a definition.
    #[error("failed to fetch schema for {type_name}: {message}")]
    Fetch { type_name: String, message: String },

    /// The collaborator answered, but has no definition for this type.
    #[error("no schema defined for {type_name}")]
    NotFound { type_name: String },

    /// The definition document is structurally wrong.
    #[error("malformed schema for {type_name}: {reason}")]
    Malformed { type_name: String, reason: String },

    /// One field entry of the definition document is unusable.
    #[error("invalid field {field} in schema {type_name}: {reason}")]
    InvalidField {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("duplicate field {field} in schema {type_name}")]
    DuplicateField { type_name: String, field: String },

    #[error("schema document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Wrap any collaborator failure as a fetch error for `type_name`.
    pub fn fetch(type_name: &str, err: impl fmt::Display) -> Self {
        SchemaError::Fetch {
            type_name: type_name.to_string(),
            message: err.to_string(),
        }
    }

    pub fn not_found(type_name: &str) -> Self {
        SchemaError::NotFound {
            type_name: type_name.to_string(),
        }
    }
}
