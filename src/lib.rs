// chunkscope: chunked ingestion, window extraction, min/max downsampling
// and playback for very large (x, y) series

pub mod core;
pub mod models;
pub mod state;
pub mod utils;

// Re-export main types
pub use crate::core::downsample::downsample;
pub use crate::core::error::{Result, ViewerError};
pub use crate::core::extract::extract;
pub use crate::core::format::{Chunk, DownsampledSeries, RawSeries, Sample, Window};
pub use crate::core::ingest::{ingest_reader, spawn_ingestion, IngestOptions, IngestSummary, Ingestor, NanPolicy};
pub use crate::core::playback::{start_playback, PlaybackClock, PlaybackHandle, TickOutcome, WindowControls};
pub use crate::core::stats::WindowStats;
pub use crate::core::store::ChunkStore;
pub use models::viewer_model::ViewerConfig;
pub use state::viewer_state::{Frame, ViewerState};

#[cfg(test)]
mod tests {
    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(DEFAULT_CHUNK_SIZE, 1_000_000);
        assert_eq!(DEFAULT_TARGET_POINTS, 5_000);
        assert_eq!(FIELDS_PER_SAMPLE, 2);
    }
}
