use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, warn};

use crate::core::downsample::downsample;
use crate::core::error::Result;
use crate::core::extract::extract;
use crate::core::format::Window;
use crate::core::ingest::{spawn_ingestion, IngestOptions, IngestSummary, IngestTask};
use crate::core::playback::{start_playback, PlaybackHandle, WindowControls};
use crate::core::stats::WindowStats;
use crate::core::store::ChunkStore;
use crate::models::viewer_model::ViewerConfig;

/// Everything the renderer needs for one redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub upper_error: Vec<f64>,
    pub lower_error: Vec<f64>,
    pub x_range: [usize; 2],
    pub raw_len: usize,
    pub total_points: usize,
    pub complete: bool,
    pub stats: Option<WindowStats>,
}

#[derive(Clone)]
pub struct ViewerState {
    // Swapped wholesale when a new file is loaded
    store: Arc<RwLock<Arc<ChunkStore>>>,
    ingestion: Arc<Mutex<Option<IngestTask>>>,
    pub controls: Arc<WindowControls>,
    options: IngestOptions,
    target_points: usize,
}

impl ViewerState {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(ChunkStore::shared())),
            ingestion: Arc::new(Mutex::new(None)),
            controls: Arc::new(WindowControls::new(
                config.window_start,
                config.window_size,
                config.animation_time(),
                config.animation_increment,
            )),
            options: config.ingest_options(),
            target_points: config.downsample_target_points,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.options.chunk_size
    }

    pub fn store(&self) -> Arc<ChunkStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Installs a fresh store and returns it; readers holding the old one
    /// keep a consistent view of the previous dataset.
    pub fn replace_store(&self) -> Arc<ChunkStore> {
        let store = ChunkStore::shared();
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = store.clone();
        store
    }

    pub fn window(&self) -> Window {
        Window::new(self.controls.window_start(), self.controls.window_size())
    }

    pub fn total_points(&self) -> usize {
        self.store().total_points()
    }

    /// Starts ingesting `path` into a new store, cancelling any ingestion
    /// still running for a previous file. Requires a tokio runtime.
    pub fn load_file(&self, path: PathBuf) {
        let store = self.replace_store();
        info!("Loading {}", path.display());
        let task = spawn_ingestion(path, store, self.options.clone());

        let previous = self
            .ingestion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            warn!("Cancelling ingestion of the previous file");
            previous.cancel();
        }
    }

    pub fn cancel_ingestion(&self) {
        if let Some(task) = self.ingestion.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            task.cancel();
        }
    }

    pub fn ingestion_finished(&self) -> bool {
        self.ingestion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(true, IngestTask::is_finished)
    }

    /// Waits for the current ingestion, if any, and returns its outcome.
    pub async fn wait_for_ingestion(&self) -> Option<Result<IngestSummary>> {
        let task = self.ingestion.lock().unwrap_or_else(PoisonError::into_inner).take()?;
        Some(task.wait().await)
    }

    /// Re-derives the visible frame from the current store and window.
    /// Call after any change to the data or the window parameters.
    pub fn recompute(&self) -> Frame {
        let store = self.store();
        let window = self.window();

        let raw = extract(&store, window, self.options.chunk_size);
        let stats = (!raw.is_empty()).then(|| WindowStats::compute(&raw.y));
        let reduced = downsample(&raw.x, &raw.y, self.target_points);

        Frame {
            x: reduced.x,
            y: reduced.y,
            upper_error: reduced.upper_error,
            lower_error: reduced.lower_error,
            x_range: [window.start, window.end()],
            raw_len: raw.len(),
            total_points: store.total_points(),
            complete: store.is_complete(),
            stats,
        }
    }

    /// Starts the playback loop against this session's window controls.
    pub fn play(&self, config: &ViewerConfig) -> PlaybackHandle {
        let store = self.store.clone();
        start_playback(
            self.controls.clone(),
            move || store.read().unwrap_or_else(PoisonError::into_inner).total_points(),
            config.frame_interval(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::{Ingestor, NanPolicy};

    fn config(chunk_size: usize, window_size: usize, target: usize) -> ViewerConfig {
        ViewerConfig {
            chunk_size,
            window_size,
            downsample_target_points: target,
            ..ViewerConfig::default()
        }
    }

    fn fill(state: &ViewerState, n: usize) {
        let store = state.replace_store();
        let mut ingestor = Ingestor::begin(store, state.chunk_size(), NanPolicy::Propagate).unwrap();
        let rows: Vec<Vec<String>> = (0..n).map(|i| vec![i.to_string(), (i % 7).to_string()]).collect();
        ingestor.push_batch(&rows);
        ingestor.finish();
    }

    #[test]
    fn test_recompute_empty_store() {
        let state = ViewerState::new(&config(10, 20, 5));
        let frame = state.recompute();
        assert!(frame.x.is_empty());
        assert!(frame.stats.is_none());
        assert_eq!(frame.x_range, [0, 20]);
    }

    #[test]
    fn test_recompute_follows_window_edits() {
        let state = ViewerState::new(&config(10, 20, 5));
        fill(&state, 100);

        let frame = state.recompute();
        assert_eq!(frame.raw_len, 20);
        assert_eq!(frame.x.len(), 5);
        assert_eq!(frame.upper_error.len(), 5);
        assert!(frame.complete);

        state.controls.set_window_start(95);
        state.controls.set_window_size(4);
        let frame = state.recompute();
        assert_eq!(frame.raw_len, 4);
        assert_eq!(frame.x, vec![95.0, 96.0, 97.0, 98.0]);
        assert!(frame.upper_error.is_empty());
        assert_eq!(frame.x_range, [95, 99]);
        assert_eq!(frame.stats.unwrap().max, 6.0);
    }

    #[test]
    fn test_frame_serializes() {
        let state = ViewerState::new(&config(10, 3, 5));
        fill(&state, 3);
        let json = serde_json::to_value(state.recompute()).unwrap();
        assert_eq!(json["x"], serde_json::json!([0.0, 1.0, 2.0]));
        assert_eq!(json["stats"]["min"], serde_json::json!(0.0));
    }

    #[tokio::test]
    async fn test_load_file_replaces_dataset() {
        let dir = std::env::temp_dir();
        let first = dir.join(format!("chunkscope-state-a-{}.csv", std::process::id()));
        let second = dir.join(format!("chunkscope-state-b-{}.csv", std::process::id()));
        std::fs::write(&first, "0,1\n1,1\n2,1\n").unwrap();
        std::fs::write(&second, "0,5\n1,6\n").unwrap();

        let state = ViewerState::new(&config(2, 10, 5));
        state.load_file(first.clone());
        state.wait_for_ingestion().await.unwrap().unwrap();
        assert_eq!(state.total_points(), 3);

        state.load_file(second.clone());
        let summary = state.wait_for_ingestion().await.unwrap().unwrap();
        std::fs::remove_file(&first).ok();
        std::fs::remove_file(&second).ok();

        assert_eq!(summary.total_points, 2);
        assert_eq!(state.recompute().y, vec![5.0, 6.0]);
        assert!(state.ingestion_finished());
    }
}
