/// Size of the signed record-length prefix in front of every record.
pub const LENGTH_HEADER_LEN: usize = 4;

/// Terminates the ASCII type tag at the front of every record payload.
pub const TAG_TERMINATOR: u8 = 0x00;

/// Marks schema entries that describe the schema itself rather than payload data.
pub const META_MARKER: char = '@';

/// Attribute name under which a decoded record carries its type tag.
pub const RECTYPE_KEY: &str = "@rectype";

/// Meta entry holding a schema's total encoded size in bytes.
pub const DATASIZE_KEY: &str = "@datasize";

/// Defaults when Option<T> is None
pub const DEFAULT_CHUNK_SIZE: usize = 0x10000; // 64 KiB, the producer's streaming read size
/// Max chunk size sanity bound (32 MiB).
pub const MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Nesting limit for schema-directed decoding.
/// Schemas arrive from outside the process; a cyclic type graph must not blow the stack.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Queue depth between the framer thread and decoder workers.
pub const DEFAULT_INFLIGHT_RECORDS: usize = 256;

/// Flag tokens understood in schema definition documents.
pub mod flag_tokens {
    pub const LITTLE_ENDIAN: &str = "LE";
    pub const BIG_ENDIAN: &str = "BE";
    pub const POINTER: &str = "PTR";
}

/// Primitive type names as they appear in definition documents.
pub mod primitive_names {
    pub const INT8: &str = "INT8";
    pub const INT16: &str = "INT16";
    pub const INT32: &str = "INT32";
    pub const INT64: &str = "INT64";
    pub const UINT8: &str = "UINT8";
    pub const UINT16: &str = "UINT16";
    pub const UINT32: &str = "UINT32";
    pub const UINT64: &str = "UINT64";
    pub const BITFIELD: &str = "BITFIELD";
    pub const FLOAT: &str = "FLOAT";
    pub const DOUBLE: &str = "DOUBLE";
    pub const TIME8: &str = "TIME8";
    pub const STRING: &str = "STRING";
}
