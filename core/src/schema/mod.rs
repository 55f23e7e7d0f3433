//! Record schemas for the decoder.
//!
//! Responsibilities:
//! - Define the compiled-in primitive type table
//! - Describe record layouts (fields, offsets, element counts, flags)
//! - Parse definition documents served by the producer
//! - Cache schemas process-wide, fetching each type at most once
//!
//! Non-responsibilities:
//! - Talking to the producer (the fetch collaborator owns transport)
//! - Decoding payload bytes

pub mod types;
pub mod parse;
pub mod registry;

pub use types::{
    Endianness,
    FieldDefinition,
    FieldFlags,
    PrimitiveKind,
    PrimitiveType,
    RecordSchema,
    SchemaError,
    PRIMITIVE_TYPES,
};
pub use parse::StaticSchemaSource;
pub use registry::{
    SchemaFetcher,
    SchemaRegistry,
};
