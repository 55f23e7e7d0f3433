use std::io;
use thiserror::Error;

use crate::{
    schema::SchemaError,
    stream::{decoding::DecodeError, framing::FrameError},
};

/// Unified stream error covering I/O, framing, schema resolution, decoding and pipeline wiring.
/// - `From<T>` impls enable `?` across the pipeline.
/// - Messages aim to be stable and contextual for logs.
#[derive(Debug, Error)]
pub enum StreamError {
    /// I/O error raised by a chunk source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record-level error (tag extraction).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Schema fetch or parse failure.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Payload decoding failure.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Pipeline wiring failure (closed channel, panicked worker).
    #[error("pipeline error: {0}")]
    Pipeline(&'static str),

    /// Generic high-level validation with a descriptive message.
    #[error("validation error: {0}")]
    Validation(String),
}
