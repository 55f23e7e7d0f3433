use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

/// Core telemetry snapshot.
/// Captures counters, throughput, stage timings, and elapsed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub chunks: u64,
    pub bytes_in: u64,
    pub records_framed: u64,
    pub bytes_framed: u64,
    pub empty_headers: u64,
    pub bytes_dropped: u64,
    pub records_decoded: u64,
    pub records_stub: u64,
    pub decode_errors: u64,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_in as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            chunks: counters.chunks,
            bytes_in: counters.bytes_in,
            records_framed: counters.records_framed,
            bytes_framed: counters.bytes_framed,
            empty_headers: counters.empty_headers,
            bytes_dropped: counters.bytes_dropped,
            records_decoded: counters.records_decoded,
            records_stub: counters.records_stub,
            decode_errors: counters.decode_errors,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Internal consistency of the counters:
    /// - every input byte is a header byte, a framed byte or a dropped byte
    /// - nothing is decoded that was not framed
    pub fn sanity_check(&self) -> bool {
        let header_bytes = (self.records_framed + self.empty_headers)
            * crate::constants::LENGTH_HEADER_LEN as u64;
        self.bytes_in == header_bytes + self.bytes_framed + self.bytes_dropped
            && self.records_decoded + self.decode_errors <= self.records_framed
            && self.records_stub <= self.records_decoded
    }
}
