//! Typed numeric views over raw byte payloads.
//!
//! Producers ship sampled data as opaque byte blobs together with a data type
//! code. `get_values` reinterprets such a blob as a vector of host-order numbers.

use byteorder::{ByteOrder, NativeEndian};
use num_enum::TryFromPrimitive;
use serde::Serialize;
use thiserror::Error;

use crate::utils::enum_name_or_hex;

/// Data type codes used by producers to describe a byte blob.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum DataType {
    Text    = 0,
    Real    = 1,
    Integer = 2,
    Dynamic = 3,
}

impl DataType {
    /// Bytes per element.
    pub fn element_size(self) -> usize {
        match self {
            DataType::Text | DataType::Dynamic => 1,
            DataType::Real => 8,
            DataType::Integer => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Bytes(Vec<i8>),
    Real(Vec<f64>),
    Integer(Vec<i32>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Bytes(v) => v.len(),
            Values::Real(v) => v.len(),
            Values::Integer(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValuesError {
    #[error("unknown data type {0}")]
    UnknownDataType(String),
}

/// Interpret the first `size` bytes of `data` as elements of `dtype`.
///
/// `size` is clamped to `data.len()`; a partial trailing element is dropped.
pub fn get_values(data: &[u8], dtype: DataType, size: usize) -> Values {
    let size = size.min(data.len());
    let count = size / dtype.element_size();
    let data = &data[..count * dtype.element_size()];

    match dtype {
        DataType::Text | DataType::Dynamic => {
            Values::Bytes(data.iter().map(|b| *b as i8).collect())
        }
        DataType::Real => {
            let mut out = vec![0f64; count];
            NativeEndian::read_f64_into(data, &mut out);
            Values::Real(out)
        }
        DataType::Integer => {
            let mut out = vec![0i32; count];
            NativeEndian::read_i32_into(data, &mut out);
            Values::Integer(out)
        }
    }
}

/// Like `get_values`, with the data type given as its wire code.
pub fn get_values_raw(data: &[u8], dtype: u8, size: usize) -> Result<Values, ValuesError> {
    let dtype = DataType::try_from_primitive(dtype)
        .map_err(|_| ValuesError::UnknownDataType(enum_name_or_hex::<DataType>(dtype)))?;
    Ok(get_values(data, dtype, size))
}
