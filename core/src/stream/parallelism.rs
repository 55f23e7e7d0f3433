use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::DEFAULT_INFLIGHT_RECORDS;

/// Parallelism configuration for the threaded decode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelismProfile {
    /// Decoder worker threads (at least one is always spawned).
    pub workers: usize,
    /// Bound on records queued between stages.
    pub inflight_records: usize,
}

impl Default for ParallelismProfile {
    fn default() -> Self {
        Self::single_threaded()
    }
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            workers: 1,
            inflight_records: 1,
        }
    }

    /// One worker per spare core, at most `hard_cap`.
    pub fn dynamic(hard_cap: usize) -> Self {
        let cores = num_cpus::get();
        let workers = cores.saturating_sub(1).clamp(1, hard_cap.max(1)); // leave one core for the framer

        debug!("[PROFILE] workers={workers}, inflight_records={DEFAULT_INFLIGHT_RECORDS}");

        Self {
            workers,
            inflight_records: DEFAULT_INFLIGHT_RECORDS,
        }
    }

    /// Values actually used: zero counts are raised to one.
    pub fn normalized(self) -> Self {
        Self {
            workers: self.workers.max(1),
            inflight_records: self.inflight_records.max(1),
        }
    }
}
