//! Stable public entry points.

use std::io::Read;

use crate::schema::SchemaRegistry;
use crate::stream::decoding::{DecodedRecord, DecoderConfig, RecordDecoder};
use crate::stream::framing::{try_frames, OkChunks};
use crate::stream::io::{open_input, InputSource, ReadChunks, RecordSink};
use crate::stream::pipeline::{run_decode_pipeline, DecodedRecords, PipelineConfig};
use crate::telemetry::TelemetrySnapshot;
use crate::types::StreamError;

/// Lazily decode an infallible chunk sequence against `registry`.
pub fn decode_stream<'r, I>(
    chunks: I,
    registry: &'r SchemaRegistry,
    config: DecoderConfig,
) -> DecodedRecords<'r, OkChunks<I::IntoIter>>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let decoder = RecordDecoder::with_config(registry, config);
    decode_stream_with(OkChunks(chunks.into_iter()), decoder)
}

/// Lazily decode a fallible chunk sequence with a caller-built decoder.
pub fn decode_stream_with<'r, I, C, E>(
    chunks: I,
    decoder: RecordDecoder<'r>,
) -> DecodedRecords<'r, I::IntoIter>
where
    I: IntoIterator<Item = Result<C, E>>,
    C: AsRef<[u8]>,
    E: Into<StreamError>,
{
    DecodedRecords::new(try_frames(chunks), decoder)
}

/// Decode a whole stream into memory; the first error aborts.
pub fn decode_all<I>(chunks: I, registry: &SchemaRegistry) -> Result<Vec<DecodedRecord>, StreamError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    decode_stream(chunks, registry, DecoderConfig::default()).collect()
}

/// Lazily decode everything a reader produces.
pub fn decode_reader<'r, R: Read>(
    reader: R,
    registry: &'r SchemaRegistry,
    config: &PipelineConfig,
) -> DecodedRecords<'r, ReadChunks<R>> {
    let decoder = RecordDecoder::with_config(registry, config.decoder);
    decode_stream_with(ReadChunks::new(reader, Some(config.chunk_size)), decoder)
}

/// Decode an input source on the threaded pipeline, delivering records to `sink` in order.
pub fn run_decode<S>(
    input: InputSource,
    registry: &SchemaRegistry,
    sink: &mut S,
    config: &PipelineConfig,
) -> Result<TelemetrySnapshot, StreamError>
where
    S: RecordSink + ?Sized,
{
    let reader = open_input(input)?;
    let chunks = ReadChunks::new(reader, Some(config.chunk_size));
    let decoder = RecordDecoder::with_config(registry, config.decoder);
    run_decode_pipeline(chunks, decoder, sink, config.profile)
}
