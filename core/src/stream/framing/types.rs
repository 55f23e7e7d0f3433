use std::fmt;
use bytes::Bytes;
use thiserror::Error;

use crate::constants::TAG_TERMINATOR;
use crate::utils::hex_preview;

/// One complete record as cut from the stream: `tag \0 payload`.
///
/// Owned and immutable; moving it to another thread moves the only handle to its bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RawRecord {
    bytes: Bytes,
}

impl RawRecord {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length of the type tag: bytes before the first NUL, or the whole record if there is none.
    pub fn tag_len(&self) -> usize {
        self.bytes
            .iter()
            .position(|b| *b == TAG_TERMINATOR)
            .unwrap_or(self.bytes.len())
    }

    /// Split into `(tag, payload)`.
    ///
    /// A record without a terminator is all tag and has an empty payload.
    pub fn split(&self) -> Result<(&str, &[u8]), FrameError> {
        let tag_len = self.tag_len();
        let tag = &self.bytes[..tag_len];

        if tag.is_empty() {
            return Err(FrameError::MissingTag);
        }
        if !tag.is_ascii() {
            return Err(FrameError::NonAsciiTag {
                preview: hex_preview(tag, 16),
            });
        }
        // ASCII is always valid UTF-8.
        let tag = std::str::from_utf8(tag).map_err(|_| FrameError::NonAsciiTag {
            preview: hex_preview(tag, 16),
        })?;

        let payload_start = (tag_len + 1).min(self.bytes.len());
        Ok((tag, &self.bytes[payload_start..]))
    }

    /// Zero-copy handle on the payload bytes.
    pub fn payload(&self) -> Bytes {
        let payload_start = (self.tag_len() + 1).min(self.bytes.len());
        self.bytes.slice(payload_start..)
    }
}

impl fmt::Debug for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRecord")
            .field("len", &self.bytes.len())
            .field("bytes", &hex_preview(&self.bytes, 32))
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("record has an empty type tag")]
    MissingTag,

    #[error("record type tag is not ASCII: {preview}")]
    NonAsciiTag { preview: String },

    #[error("type tag contains a NUL byte")]
    TagContainsNul,

    #[error("record too large for a 32-bit length header: {len} bytes")]
    RecordTooLarge { len: usize },
}
