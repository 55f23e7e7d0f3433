use std::sync::Arc;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::trace;

use crate::schema::{
    Endianness, FieldDefinition, PrimitiveKind, PrimitiveType, RecordSchema, SchemaError,
    SchemaFetcher, SchemaRegistry,
};
use crate::stream::decoding::types::{DecodeError, DecodedRecord, DecoderConfig, Scalar, Value};
use crate::stream::framing::RawRecord;

/// Decodes payloads against schemas held by a registry.
///
/// Without a fetcher only already-registered types are decoded; unknown
/// top-level types give a stub and unknown nested types are left out.
/// With a fetcher, missing types are fetched through the registry on first use.
#[derive(Clone, Copy)]
pub struct RecordDecoder<'r> {
    registry: &'r SchemaRegistry,
    fetcher: Option<&'r dyn SchemaFetcher>,
    config: DecoderConfig,
}

impl<'r> RecordDecoder<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_config(registry, DecoderConfig::default())
    }

    pub fn with_config(registry: &'r SchemaRegistry, config: DecoderConfig) -> Self {
        Self {
            registry,
            fetcher: None,
            config,
        }
    }

    /// Fetch unregistered types on demand.
    pub fn with_fetcher(mut self, fetcher: &'r dyn SchemaFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Split a framed record into tag and payload, then decode it.
    pub fn decode_raw(&self, raw: &RawRecord) -> Result<DecodedRecord, DecodeError> {
        let (tag, payload) = raw.split()?;
        self.decode(tag, payload)
    }

    pub fn decode(&self, type_name: &str, payload: &[u8]) -> Result<DecodedRecord, DecodeError> {
        self.decode_at_depth(type_name, payload, 0)
    }

    fn decode_at_depth(
        &self,
        type_name: &str,
        payload: &[u8],
        depth: usize,
    ) -> Result<DecodedRecord, DecodeError> {
        if depth > self.config.max_depth {
            return Err(DecodeError::DepthExceeded {
                type_name: type_name.to_string(),
                max_depth: self.config.max_depth,
            });
        }

        let mut record = DecodedRecord::new(type_name);
        let Some(schema) = self.resolve(type_name)? else {
            trace!(type_name, "no schema registered, emitting stub");
            return Ok(record);
        };

        for field in schema.decodable_fields() {
            if let Some(value) = self.decode_field(field, payload, depth)? {
                record.push(field.name.as_str(), value);
            }
        }
        Ok(record)
    }

    /// `None` when no definition exists; a failing fetch is still an error.
    fn resolve(&self, type_name: &str) -> Result<Option<Arc<RecordSchema>>, DecodeError> {
        if let Some(schema) = self.registry.get(type_name) {
            return Ok(Some(schema));
        }
        let Some(fetcher) = self.fetcher else {
            return Ok(None);
        };
        match self.registry.get_or_fetch(type_name, fetcher) {
            Ok(schema) => Ok(Some(schema)),
            Err(SchemaError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// `None` means the field is left out of the record.
    fn decode_field(
        &self,
        field: &FieldDefinition,
        payload: &[u8],
        depth: usize,
    ) -> Result<Option<Value>, DecodeError> {
        let tail = payload.get(field.byte_offset()..).unwrap_or(&[]);

        if let Some(primitive) = PrimitiveType::lookup(&field.type_name) {
            if !primitive.is_supported() {
                trace!(field = %field.name, kind = primitive.name, "unsupported primitive, field omitted");
                return Ok(None);
            }
            return Ok(decode_primitive(primitive, field, tail));
        }

        match self.resolve(&field.type_name)? {
            Some(schema) => self.decode_nested(&schema, field, tail, depth).map(Some),
            None => {
                trace!(field = %field.name, type_name = %field.type_name, "unresolved type, field omitted");
                Ok(None)
            }
        }
    }

    fn decode_nested(
        &self,
        schema: &RecordSchema,
        field: &FieldDefinition,
        tail: &[u8],
        depth: usize,
    ) -> Result<Value, DecodeError> {
        if !field.is_array() {
            let record = self.decode_at_depth(schema.type_name(), tail, depth + 1)?;
            return Ok(Value::Record(Box::new(record)));
        }

        // Elements of a zero-sized type all sit at the same offset, so at most one is decoded.
        let datasize = schema.datasize();
        let count = match (field.is_rest_of_buffer(), datasize) {
            (true, 0) => 0,
            (true, size) => tail.len() / size,
            (false, 0) => declared_count(field).min(1),
            (false, size) => declared_count(field).min(tail.len() / size),
        };

        let mut records = Vec::with_capacity(count.min(tail.len().max(1)));
        for i in 0..count {
            let start = i.saturating_mul(datasize);
            let element = tail.get(start..).unwrap_or(&[]);
            records.push(self.decode_at_depth(schema.type_name(), element, depth + 1)?);
        }
        Ok(Value::Records(records))
    }
}

fn declared_count(field: &FieldDefinition) -> usize {
    usize::try_from(field.elements).unwrap_or(0)
}

fn decode_primitive(primitive: &PrimitiveType, field: &FieldDefinition, tail: &[u8]) -> Option<Value> {
    let available = tail.len() / primitive.size;
    let count = if field.is_rest_of_buffer() {
        available
    } else {
        declared_count(field).min(available)
    };

    if !field.is_array() && count == 0 {
        return None;
    }

    if primitive.kind == PrimitiveKind::String {
        return Some(Value::Scalar(Scalar::Bytes(tail[..count].to_vec())));
    }

    let endianness = field.flags.endianness();
    if !field.is_array() {
        return Some(Value::Scalar(read_scalar(primitive.kind, endianness, tail)));
    }

    let items = tail
        .chunks_exact(primitive.size)
        .take(count)
        .map(|bytes| read_scalar(primitive.kind, endianness, bytes))
        .collect();
    Some(Value::Array(items))
}

fn read_scalar(kind: PrimitiveKind, endianness: Endianness, bytes: &[u8]) -> Scalar {
    match endianness {
        Endianness::Little => read_as::<LittleEndian>(kind, bytes),
        Endianness::Big => read_as::<BigEndian>(kind, bytes),
    }
}

/// Caller guarantees `bytes` holds at least one element of `kind`.
fn read_as<B: ByteOrder>(kind: PrimitiveKind, bytes: &[u8]) -> Scalar {
    match kind {
        PrimitiveKind::Int8 => Scalar::I8(bytes[0] as i8),
        PrimitiveKind::Int16 => Scalar::I16(B::read_i16(bytes)),
        PrimitiveKind::Int32 => Scalar::I32(B::read_i32(bytes)),
        PrimitiveKind::Int64 => Scalar::I64(B::read_i64(bytes)),
        PrimitiveKind::UInt8 => Scalar::U8(bytes[0]),
        PrimitiveKind::UInt16 => Scalar::U16(B::read_u16(bytes)),
        PrimitiveKind::UInt32 => Scalar::U32(B::read_u32(bytes)),
        PrimitiveKind::UInt64 => Scalar::U64(B::read_u64(bytes)),
        PrimitiveKind::Float => Scalar::F32(B::read_f32(bytes)),
        PrimitiveKind::Double => Scalar::F64(B::read_f64(bytes)),
        PrimitiveKind::Time8 => Scalar::Time(B::read_u64(bytes)),
        PrimitiveKind::String => Scalar::Bytes(bytes[..1].to_vec()),
        // Filtered out by `PrimitiveType::is_supported`.
        PrimitiveKind::BitField => Scalar::Bytes(Vec::new()),
    }
}
