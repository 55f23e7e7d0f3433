//! stream/io.rs
//! Chunk sources over `std::io::Read` and ordered delivery of decoded records.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use bytes::Bytes;
use tracing::trace;

use crate::stream::decoding::DecodedRecord;
use crate::types::StreamError;
use crate::utils::best_chunk_size;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Normalize input source into a boxed reader
pub fn open_input(src: InputSource) -> Result<Box<dyn Read + Send>, StreamError> {
    let reader: Box<dyn Read + Send> = match src {
        InputSource::Reader(r) => r,
        InputSource::File(p) => Box::new(std::fs::File::open(p)?),
        InputSource::Memory(b) => Box::new(std::io::Cursor::new(b)),
    };
    Ok(reader)
}

/// Chunk source over a reader: one `read` call per chunk, at most `chunk_size` bytes each.
///
/// Chunk sizes follow whatever the reader returns, so record boundaries land anywhere.
#[derive(Debug)]
pub struct ReadChunks<R> {
    inner: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> ReadChunks<R> {
    /// `chunk_size` of `None` or `0` selects `DEFAULT_CHUNK_SIZE`.
    pub fn new(inner: R, chunk_size: Option<usize>) -> Self {
        Self {
            inner,
            chunk_size: best_chunk_size(chunk_size),
            done: false,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for ReadChunks<R> {
    type Item = Result<Bytes, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    trace!("[READER] chunk of {n} bytes");
                    buf.truncate(n);
                    return Some(Ok(Bytes::from(buf)));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

/// Consumer of decoded records, in stream order.
pub trait RecordSink {
    fn accept(&mut self, record: DecodedRecord) -> Result<(), StreamError>;

    /// Called once after the last record.
    fn finish(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

impl RecordSink for Vec<DecodedRecord> {
    fn accept(&mut self, record: DecodedRecord) -> Result<(), StreamError> {
        self.push(record);
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn accept(&mut self, record: DecodedRecord) -> Result<(), StreamError> {
        (**self).accept(record)
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        (**self).finish()
    }
}

/// Adapts a closure into a `RecordSink`.
pub struct SinkFn<F>(pub F);

impl<F> RecordSink for SinkFn<F>
where
    F: FnMut(DecodedRecord) -> Result<(), StreamError>,
{
    fn accept(&mut self, record: DecodedRecord) -> Result<(), StreamError> {
        (self.0)(record)
    }
}

/// Restores stream order for records decoded out of order.
///
/// Records are keyed by their position in the stream; each is handed to the
/// inner sink as soon as every earlier position has been delivered.
pub struct OrderedRecordSink<'a, S: RecordSink + ?Sized> {
    out: &'a mut S,
    next: u64,
    pending: BTreeMap<u64, DecodedRecord>,
}

impl<'a, S: RecordSink + ?Sized> OrderedRecordSink<'a, S> {
    pub fn new(out: &'a mut S) -> Self {
        Self {
            out,
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, seq: u64, record: DecodedRecord) -> Result<(), StreamError> {
        if seq < self.next || self.pending.contains_key(&seq) {
            return Err(StreamError::Validation(format!(
                "record {seq} delivered twice"
            )));
        }
        self.pending.insert(seq, record);
        self.flush_ready()
    }

    /// Records handed to the inner sink so far.
    pub fn delivered(&self) -> u64 {
        self.next
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn finish(&mut self) -> Result<(), StreamError> {
        self.flush_ready()?;

        if let Some(first) = self.pending.keys().next() {
            return Err(StreamError::Validation(format!(
                "record {} never arrived ({} records held after it, first at {first})",
                self.next,
                self.pending.len()
            )));
        }

        self.out.finish()
    }

    fn flush_ready(&mut self) -> Result<(), StreamError> {
        while let Some(record) = self.pending.remove(&self.next) {
            self.out.accept(record)?;
            self.next += 1;
        }
        Ok(())
    }
}
