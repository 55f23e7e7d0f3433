use byteorder::{ByteOrder, NativeEndian};

use crate::constants::{LENGTH_HEADER_LEN, TAG_TERMINATOR};
use crate::stream::framing::types::FrameError;

/// Length prefix in host byte order, as the producer writes it.
///
/// Zero or negative values are legal on the wire and frame no record.
pub fn encode_length_header(len: i32) -> [u8; LENGTH_HEADER_LEN] {
    let mut buf = [0u8; LENGTH_HEADER_LEN];
    NativeEndian::write_i32(&mut buf, len);
    buf
}

/// Encode one record into wire format.
///
/// Layout:
///
/// ```text
/// [ length  (4, signed, host order) ]
/// [ tag     (N, ASCII)              ]
/// [ NUL     (1)                     ]
/// [ payload (M)                     ]
/// ```
pub fn encode_record(tag: &str, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if tag.is_empty() {
        return Err(FrameError::MissingTag);
    }
    if !tag.is_ascii() {
        return Err(FrameError::NonAsciiTag { preview: hex::encode(tag) });
    }
    if tag.as_bytes().contains(&TAG_TERMINATOR) {
        return Err(FrameError::TagContainsNul);
    }

    let record_len = tag.len() + 1 + payload.len();
    let header_len = i32::try_from(record_len)
        .map_err(|_| FrameError::RecordTooLarge { len: record_len })?;

    let mut out = Vec::with_capacity(LENGTH_HEADER_LEN + record_len);
    out.extend_from_slice(&encode_length_header(header_len));
    out.extend_from_slice(tag.as_bytes());
    out.push(TAG_TERMINATOR);
    out.extend_from_slice(payload);

    debug_assert_eq!(out.len(), LENGTH_HEADER_LEN + record_len);
    Ok(out)
}
