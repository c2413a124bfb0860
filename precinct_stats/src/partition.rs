use log::debug;

use crate::config::AggregationErrors;

/// Splits the records into contiguous chunks of at most `chunk_size` elements.
///
/// The original order is preserved. An input that fits in a single chunk
/// (including an empty input) is returned as one chunk.
pub fn partition<T>(records: &[T], chunk_size: usize) -> Result<Vec<&[T]>, AggregationErrors> {
    if chunk_size == 0 {
        return Err(AggregationErrors::InvalidChunkSize(chunk_size));
    }
    if records.len() <= chunk_size {
        return Ok(vec![records]);
    }
    let chunks: Vec<&[T]> = records.chunks(chunk_size).collect();
    debug!(
        "partition: {} records -> {} chunks of at most {}",
        records.len(),
        chunks.len(),
        chunk_size
    );
    Ok(chunks)
}
