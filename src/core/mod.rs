pub mod compression;
pub mod constants;
pub mod downsample;
pub mod error;
pub mod extract;
pub mod format;
pub mod ingest;
pub mod playback;
pub mod stats;
pub mod store;
