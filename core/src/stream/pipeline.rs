//! stream/pipeline.rs
//! Pipeline wiring: framing → decoding → delivery. No wire or schema logic lives here.
//!
//! Two shapes:
//! - `DecodedRecords`: lazy, single-threaded, pull-driven
//! - `run_decode_pipeline`: framer thread, N decoder workers, ordered delivery on the caller's thread

use std::thread;
use std::time::{Duration, Instant};
use std::collections::VecDeque;

use crossbeam::channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::DEFAULT_CHUNK_SIZE;
use crate::stream::decoding::{DecodeError, DecodedRecord, DecoderConfig, RecordDecoder};
use crate::stream::framing::{Framer, RawRecord, TryFrames};
use crate::stream::io::{OrderedRecordSink, RecordSink};
use crate::stream::parallelism::ParallelismProfile;
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

/// Everything needed to run a decode, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Read size for reader-backed chunk sources; `0` selects the default.
    pub chunk_size: usize,
    pub decoder: DecoderConfig,
    pub profile: ParallelismProfile,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            decoder: DecoderConfig::default(),
            profile: ParallelismProfile::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(profile: ParallelismProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    /// Missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, StreamError> {
        serde_json::from_str(text)
            .map_err(|e| StreamError::Validation(format!("invalid pipeline config: {e}")))
    }
}

// ============================================================
// Sequential pipeline
// ============================================================

/// Lazy iterator of decoded records.
///
/// A record that fails to decode yields `Err` and iteration continues with
/// the next record. A chunk source error is yielded once and ends iteration.
pub struct DecodedRecords<'r, I> {
    frames: TryFrames<I>,
    decoder: RecordDecoder<'r>,
    decoded: TelemetryCounters,
}

impl<'r, I> DecodedRecords<'r, I> {
    pub fn new(frames: TryFrames<I>, decoder: RecordDecoder<'r>) -> Self {
        Self {
            frames,
            decoder,
            decoded: TelemetryCounters::default(),
        }
    }

    /// Framing and decoding counters accumulated so far.
    pub fn counters(&self) -> TelemetryCounters {
        let mut counters = self.frames.counters().clone();
        counters.merge(&self.decoded);
        counters
    }
}

impl<'r, I, C, E> Iterator for DecodedRecords<'r, I>
where
    I: Iterator<Item = Result<C, E>>,
    C: AsRef<[u8]>,
    E: Into<StreamError>,
{
    type Item = Result<DecodedRecord, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.frames.next()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };

        match self.decoder.decode_raw(&raw) {
            Ok(record) => {
                self.decoded.add_decoded(record.is_stub());
                Some(Ok(record))
            }
            Err(e) => {
                self.decoded.add_decode_error();
                debug!("record failed to decode: {e}");
                Some(Err(e.into()))
            }
        }
    }
}

// ============================================================
// Threaded pipeline
// ============================================================

struct WorkerOutput {
    seq: u64,
    result: Result<DecodedRecord, DecodeError>,
    elapsed: Duration,
}

/// Decode a chunk stream on worker threads and deliver records to `sink` in stream order.
///
/// Stops at the first decode, sink or chunk source error; threads drain and exit
/// before the error is returned.
pub fn run_decode_pipeline<I, C, E, S>(
    chunks: I,
    decoder: RecordDecoder<'_>,
    sink: &mut S,
    profile: ParallelismProfile,
) -> Result<TelemetrySnapshot, StreamError>
where
    I: IntoIterator<Item = Result<C, E>>,
    I::IntoIter: Send,
    C: AsRef<[u8]>,
    E: Into<StreamError>,
    S: RecordSink + ?Sized,
{
    let profile = profile.normalized();
    let mut counters = TelemetryCounters::default();
    let mut timer = TelemetryTimer::new();
    let chunks = chunks.into_iter();

    debug!(
        "[PIPELINE] start decode pipeline: workers={}, inflight={}",
        profile.workers, profile.inflight_records
    );

    let (frame_result, deliver_result) = thread::scope(|scope| {
        // ---- Channels ----
        let (raw_tx, raw_rx) = bounded::<(u64, RawRecord)>(profile.inflight_records);
        let (out_tx, out_rx) = bounded::<WorkerOutput>(profile.inflight_records);

        // ---- Framer thread ----
        let framer = scope.spawn(move || frame_chunks(chunks, raw_tx));

        // ---- Workers ----
        for i in 0..profile.workers {
            let rx = raw_rx.clone();
            let tx = out_tx.clone();
            scope.spawn(move || decode_worker(i, decoder, rx, tx));
        }

        drop(raw_rx);
        drop(out_tx);

        // ---- Ordered delivery ----
        let deliver_result = deliver(out_rx, sink, &mut counters, &mut timer);

        let frame_result = framer
            .join()
            .map_err(|_| StreamError::Pipeline("framer thread panicked"))
            .and_then(|r| r);

        (frame_result, deliver_result)
    });

    // A delivery error closes the channels, which makes the framer fail too; report the cause.
    deliver_result?;
    let (frame_counters, frame_time) = frame_result?;

    counters.merge(&frame_counters);
    timer.add_stage_time(Stage::Frame, frame_time);
    timer.finish();

    debug!(
        "[PIPELINE] done: {} records framed, {} decoded",
        counters.records_framed, counters.records_decoded
    );
    Ok(TelemetrySnapshot::from(&counters, &timer))
}

fn frame_chunks<I, C, E>(
    chunks: I,
    tx: Sender<(u64, RawRecord)>,
) -> Result<(TelemetryCounters, Duration), StreamError>
where
    I: Iterator<Item = Result<C, E>>,
    C: AsRef<[u8]>,
    E: Into<StreamError>,
{
    debug!("[READER] thread started");
    let mut framer = Framer::new();
    let mut pending = VecDeque::new();
    let mut busy = Duration::ZERO;
    let mut seq = 0u64;

    for chunk in chunks {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return Err(e.into()),
        };

        let started = Instant::now();
        framer.push(chunk.as_ref(), &mut pending);
        busy += started.elapsed();

        for raw in pending.drain(..) {
            tx.send((seq, raw))
                .map_err(|_| StreamError::Pipeline("record channel closed"))?;
            seq += 1;
        }
    }

    framer.finish();
    debug!("[READER] finished after {seq} records, dropping record sender");
    Ok((framer.into_counters(), busy))
}

fn decode_worker(
    id: usize,
    decoder: RecordDecoder<'_>,
    rx: Receiver<(u64, RawRecord)>,
    tx: Sender<WorkerOutput>,
) {
    debug!("[WORKER-{id}] starting");
    for (seq, raw) in rx.iter() {
        let started = Instant::now();
        let result = decoder.decode_raw(&raw);
        let output = WorkerOutput {
            seq,
            result,
            elapsed: started.elapsed(),
        };
        if tx.send(output).is_err() {
            debug!("[WORKER-{id}] result channel closed");
            break;
        }
    }
    debug!("[WORKER-{id}] finished");
}

fn deliver<S>(
    rx: Receiver<WorkerOutput>,
    sink: &mut S,
    counters: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
) -> Result<(), StreamError>
where
    S: RecordSink + ?Sized,
{
    let mut ordered = OrderedRecordSink::new(sink);

    for output in rx.iter() {
        timer.add_stage_time(Stage::Decode, output.elapsed);

        let record = match output.result {
            Ok(record) => record,
            Err(e) => {
                counters.add_decode_error();
                warn!("[WRITER] record {} failed to decode: {e}", output.seq);
                return Err(e.into());
            }
        };
        counters.add_decoded(record.is_stub());

        let started = Instant::now();
        ordered.push(output.seq, record)?;
        timer.add_stage_time(Stage::Sink, started.elapsed());
    }

    debug!("[WRITER] result channel closed, finishing sink");
    ordered.finish()
}
