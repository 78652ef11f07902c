// Defaults and input format constants

use std::path::Path;

pub const DEFAULT_WINDOW_START: usize = 0;
pub const DEFAULT_WINDOW_SIZE: usize = 1_000;
pub const DEFAULT_ANIMATION_INCREMENT: usize = 10;
pub const DEFAULT_ANIMATION_TIME_MS: u64 = 500;

// 1M samples per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

// 5K points per screen
pub const DEFAULT_TARGET_POINTS: usize = 5_000;

// Host tick period for the polling scheduler (~60 fps)
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

// Rows handed to the ingestor per parser batch
pub const DEFAULT_BATCH_ROWS: usize = 10_000;

// Only the first two fields of a row are consumed: (x, y)
pub const FIELDS_PER_SAMPLE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCompression {
    None,
    Gzip,
    Lz4,
    Zstd,
}

impl InputCompression {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("gz") => InputCompression::Gzip,
            Some("lz4") => InputCompression::Lz4,
            Some("zst") | Some("zstd") => InputCompression::Zstd,
            _ => InputCompression::None,
        }
    }
}
