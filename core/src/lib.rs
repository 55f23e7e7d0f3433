//! recstream-core
//!
//! Reassembles length-prefixed records from a chunked byte stream and decodes
//! each one against a runtime-supplied schema.
//! No transport, no async runtime.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod schema;
pub mod telemetry;
pub mod values;

// Stream layers
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::schema::{
        FieldDefinition, FieldFlags, RecordSchema, SchemaError, SchemaFetcher, SchemaRegistry,
        StaticSchemaSource,
    };
    pub use crate::stream::{
        decode_all, decode_reader, decode_stream, decode_stream_with, encode_record, frames,
        run_decode, run_decode_pipeline, DecodedRecord, DecoderConfig, InputSource,
        ParallelismProfile, PipelineConfig, RawRecord, RecordDecoder, RecordSink, Scalar, SinkFn,
        Value,
    };
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::StreamError;
    pub use crate::values::{get_values, DataType, Values};
}
