use std::fmt;
use num_enum::TryFromPrimitive;

use crate::constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Hex rendering of at most `max` leading bytes, with a trailing `..` when cut.
pub fn hex_preview(data: &[u8], max: usize) -> String {
    if data.len() <= max {
        hex::encode(data)
    } else {
        format!("{}..", hex::encode(&data[..max]))
    }
}

/// Normalize a requested read size for chunk sources.
///
/// - `None` or `0` → `DEFAULT_CHUNK_SIZE`
/// - anything above `MAX_CHUNK_SIZE` is clamped
pub fn best_chunk_size(requested: Option<usize>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_CHUNK_SIZE,
        Some(size) => size.min(MAX_CHUNK_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_preview_cuts_long_input() {
        assert_eq!(hex_preview(&[0xde, 0xad], 4), "dead");
        assert_eq!(hex_preview(&[0xde, 0xad, 0xbe, 0xef], 2), "dead..");
    }

    #[test]
    fn chunk_size_defaults_and_clamps() {
        assert_eq!(best_chunk_size(None), DEFAULT_CHUNK_SIZE);
        assert_eq!(best_chunk_size(Some(0)), DEFAULT_CHUNK_SIZE);
        assert_eq!(best_chunk_size(Some(17)), 17);
        assert_eq!(best_chunk_size(Some(usize::MAX)), MAX_CHUNK_SIZE);
    }
}
