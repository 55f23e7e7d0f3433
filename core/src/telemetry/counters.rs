//! telemetry/counters.rs
//! Mutable counters used during record streaming.
//!
//! Summary: collects chunk, framing and decode counts.
//! Converted into an immutable TelemetrySnapshot at pipeline end.
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Deterministic counters collected during stream processing
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub chunks: u64,
    pub bytes_in: u64,
    pub records_framed: u64,
    pub bytes_framed: u64,
    pub empty_headers: u64,
    pub bytes_dropped: u64,
    pub records_decoded: u64,
    pub records_stub: u64,
    pub decode_errors: u64,
}

impl TelemetryCounters {
    /// Record one chunk handed to the framer (zero-length chunks included).
    pub fn add_chunk(&mut self, len: usize) {
        self.chunks += 1;
        self.bytes_in += len as u64;
    }

    /// Record one complete record emitted by the framer.
    /// - `record_len`: bytes after the length header
    pub fn add_record(&mut self, record_len: usize) {
        self.records_framed += 1;
        self.bytes_framed += record_len as u64;
    }

    /// A length header announced zero or negative bytes.
    pub fn add_empty_header(&mut self) {
        self.empty_headers += 1;
    }

    /// Partial header/body bytes discarded at end of stream.
    pub fn add_dropped(&mut self, bytes: usize) {
        self.bytes_dropped += bytes as u64;
    }

    /// Record one decoded record.
    /// - `stub`: the record carries only its type tag
    pub fn add_decoded(&mut self, stub: bool) {
        self.records_decoded += 1;
        if stub {
            self.records_stub += 1;
        }
    }

    pub fn add_decode_error(&mut self) {
        self.decode_errors += 1;
    }

    /// Bytes consumed as length headers (including empty ones).
    pub fn header_bytes(&self) -> u64 {
        (self.records_framed + self.empty_headers) * crate::constants::LENGTH_HEADER_LEN as u64
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks += other.chunks;
        self.bytes_in += other.bytes_in;
        self.records_framed += other.records_framed;
        self.bytes_framed += other.bytes_framed;
        self.empty_headers += other.empty_headers;
        self.bytes_dropped += other.bytes_dropped;
        self.records_decoded += other.records_decoded;
        self.records_stub += other.records_stub;
        self.decode_errors += other.decode_errors;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
