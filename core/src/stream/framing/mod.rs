//! Record framing.
//!
//! Responsibilities:
//! - Reassemble length-prefixed records from arbitrarily chunked input
//! - Split a record into its type tag and payload
//! - Encode records in the same layout (producer side, replays, tests)
//!
//! Non-responsibilities:
//! - Schemas
//! - Payload decoding
//! - IO

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{
    FrameError,
    RawRecord,
};
pub use encode::{
    encode_length_header,
    encode_record,
};
pub use decode::{
    frames,
    try_frames,
    Framer,
    Frames,
    OkChunks,
    TryFrames,
};
