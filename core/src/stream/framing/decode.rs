use std::collections::VecDeque;
use bytes::{BufMut, BytesMut};
use byteorder::{ByteOrder, NativeEndian};
use tracing::{debug, trace};

use crate::constants::LENGTH_HEADER_LEN;
use crate::stream::framing::types::RawRecord;
use crate::telemetry::TelemetryCounters;
use crate::types::StreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Collecting the 4-byte length prefix.
    Header,
    /// Collecting `remaining` more record bytes.
    Body { remaining: usize },
}

/// Incremental length-prefix framer.
///
/// Chunk boundaries carry no meaning: any split of the same byte stream
/// produces the same records in the same order.
#[derive(Debug)]
pub struct Framer {
    phase: Phase,
    header: [u8; LENGTH_HEADER_LEN],
    header_filled: usize,
    body: BytesMut,
    counters: TelemetryCounters,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Header,
            header: [0u8; LENGTH_HEADER_LEN],
            header_filled: 0,
            body: BytesMut::new(),
            counters: TelemetryCounters::default(),
        }
    }

    /// Feed one chunk; every record completed by it is appended to `out`.
    pub fn push(&mut self, mut chunk: &[u8], out: &mut VecDeque<RawRecord>) {
        self.counters.add_chunk(chunk.len());

        while !chunk.is_empty() {
            match self.phase {
                Phase::Header => {
                    let take = (LENGTH_HEADER_LEN - self.header_filled).min(chunk.len());
                    self.header[self.header_filled..self.header_filled + take]
                        .copy_from_slice(&chunk[..take]);
                    self.header_filled += take;
                    chunk = &chunk[take..];

                    if self.header_filled < LENGTH_HEADER_LEN {
                        continue;
                    }
                    self.header_filled = 0;

                    let len = NativeEndian::read_i32(&self.header);
                    if len <= 0 {
                        // Keepalive or malformed prefix; frames nothing.
                        trace!("[FRAMER] empty length header ({len})");
                        self.counters.add_empty_header();
                        continue;
                    }

                    // Reserve only what this chunk can supply; the header is untrusted.
                    let remaining = len as usize;
                    self.body.reserve(remaining.min(chunk.len()));
                    self.phase = Phase::Body { remaining };
                }
                Phase::Body { remaining } => {
                    let take = remaining.min(chunk.len());
                    self.body.put_slice(&chunk[..take]);
                    chunk = &chunk[take..];

                    if take < remaining {
                        self.phase = Phase::Body { remaining: remaining - take };
                        continue;
                    }

                    let record = self.body.split().freeze();
                    self.counters.add_record(record.len());
                    out.push_back(RawRecord::new(record));
                    self.phase = Phase::Header;
                }
            }
        }
    }

    /// End of stream. Discards any partial header or body and returns the
    /// number of bytes dropped. The framer is idle afterwards.
    pub fn finish(&mut self) -> usize {
        let dropped = match self.phase {
            Phase::Header => self.header_filled,
            Phase::Body { .. } => LENGTH_HEADER_LEN + self.body.len(),
        };

        if dropped > 0 {
            debug!("[FRAMER] dropping {dropped} bytes of an incomplete record at end of stream");
            self.counters.add_dropped(dropped);
        }

        self.phase = Phase::Header;
        self.header_filled = 0;
        self.body.clear();
        dropped
    }

    /// True when no partial record is buffered.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Header && self.header_filled == 0
    }

    pub fn counters(&self) -> &TelemetryCounters {
        &self.counters
    }

    pub fn into_counters(self) -> TelemetryCounters {
        self.counters
    }
}

/// Lazy record iterator over an infallible chunk source.
pub struct Frames<I> {
    chunks: I,
    framer: Framer,
    pending: VecDeque<RawRecord>,
    done: bool,
}

pub fn frames<I>(chunks: I) -> Frames<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Frames {
        chunks: chunks.into_iter(),
        framer: Framer::new(),
        pending: VecDeque::new(),
        done: false,
    }
}

impl<I> Frames<I> {
    pub fn counters(&self) -> &TelemetryCounters {
        self.framer.counters()
    }
}

impl<I> Iterator for Frames<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(record);
            }
            if self.done {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => self.framer.push(chunk.as_ref(), &mut self.pending),
                None => {
                    self.framer.finish();
                    self.done = true;
                }
            }
        }
    }
}

/// Lazy record iterator over a fallible chunk source.
///
/// Records completed before a source error are still yielded; the error
/// comes next and ends the iteration.
pub struct TryFrames<I> {
    chunks: I,
    framer: Framer,
    pending: VecDeque<RawRecord>,
    error: Option<StreamError>,
    done: bool,
}

pub fn try_frames<I, C, E>(chunks: I) -> TryFrames<I::IntoIter>
where
    I: IntoIterator<Item = Result<C, E>>,
    C: AsRef<[u8]>,
    E: Into<StreamError>,
{
    TryFrames {
        chunks: chunks.into_iter(),
        framer: Framer::new(),
        pending: VecDeque::new(),
        error: None,
        done: false,
    }
}

impl<I> TryFrames<I> {
    pub fn counters(&self) -> &TelemetryCounters {
        self.framer.counters()
    }
}

impl<I, C, E> Iterator for TryFrames<I>
where
    I: Iterator<Item = Result<C, E>>,
    C: AsRef<[u8]>,
    E: Into<StreamError>,
{
    type Item = Result<RawRecord, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if let Some(err) = self.error.take() {
                return Some(Err(err));
            }
            if self.done {
                return None;
            }
            match self.chunks.next() {
                Some(Ok(chunk)) => self.framer.push(chunk.as_ref(), &mut self.pending),
                Some(Err(err)) => {
                    self.error = Some(err.into());
                    self.done = true;
                }
                None => {
                    self.framer.finish();
                    self.done = true;
                }
            }
        }
    }
}

/// Lifts an infallible chunk source into the fallible shape the pipeline takes.
pub struct OkChunks<I>(pub I);

impl<I> Iterator for OkChunks<I>
where
    I: Iterator,
{
    type Item = Result<I::Item, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Ok)
    }
}
