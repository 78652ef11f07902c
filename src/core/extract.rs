// Window extraction: stitch the chunks covering a window into one series

use crate::core::format::{RawSeries, Window};
use crate::core::store::ChunkStore;

/// Copies the samples of `window` out of `store` in ascending index order.
///
/// Chunks that are not in the store yet are skipped, so the result may be
/// shorter than `window.size`. The store is only read; the returned series
/// owns its data.
pub fn extract(store: &ChunkStore, window: Window, chunk_size: usize) -> RawSeries {
    if chunk_size == 0 || window.size == 0 {
        return RawSeries::default();
    }

    let start_chunk = window.start / chunk_size;
    let end_chunk = window.end() / chunk_size;

    let mut series = RawSeries::with_capacity(window.size.min(store.total_points()));

    for chunk in store.chunks_in(start_chunk..=end_chunk) {
        let local_start = window.start.saturating_sub(chunk.start_index);
        let local_end = window.end().min(chunk.end_index()).saturating_sub(chunk.start_index);
        if local_start >= local_end {
            continue;
        }

        for sample in &chunk.data[local_start..local_end] {
            series.push(*sample);
        }
    }

    series
}
