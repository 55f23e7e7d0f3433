//! Schema-directed record decoding.
//!
//! Responsibilities:
//! - Turn a tag + payload into a typed `DecodedRecord`, recursing into nested schemas
//! - Tolerate producers that under-fill payloads (short data decodes to fewer elements)
//!
//! Non-responsibilities:
//! - Framing
//! - Fetching schemas (delegated to the registry and its fetcher)

pub mod types;
pub mod decode;

pub use types::{
    DecodeError,
    DecodedRecord,
    DecoderConfig,
    Scalar,
    Value,
};
pub use decode::RecordDecoder;
