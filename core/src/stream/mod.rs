//! stream: record stream framing, schema-directed decoding and pipeline wiring.
//!
//! Layering, bottom up: `framing` knows bytes, `decoding` knows schemas,
//! `pipeline` knows threads, `core` is the public face.

pub mod framing;
pub mod decoding;
pub mod io;
pub mod parallelism;
pub mod pipeline;
pub mod core;

pub use framing::{
    encode_record,
    frames,
    FrameError,
    Framer,
    RawRecord,
};

pub use decoding::{
    DecodeError,
    DecodedRecord,
    DecoderConfig,
    RecordDecoder,
    Scalar,
    Value,
};

pub use io::{
    InputSource,
    OrderedRecordSink,
    ReadChunks,
    RecordSink,
    SinkFn,
};

pub use parallelism::ParallelismProfile;
pub use pipeline::{run_decode_pipeline, DecodedRecords, PipelineConfig};

pub use self::core::{
    decode_all,
    decode_reader,
    decode_stream,
    decode_stream_with,
    run_decode,
};
