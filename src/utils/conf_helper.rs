use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::core::error::{Result, ViewerError};
use crate::models::viewer_model::ViewerConfig;

static CONFIG_CACHE: OnceLock<ViewerConfig> = OnceLock::new();

/// Reads a JSON config file. A missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ViewerConfig> {
    let path = path.as_ref();

    let config = match std::fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data)
            .map_err(|e| ViewerError::InvalidConfig(format!("JSON Parse Error: {e} {}", path.display())))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config {} not found, using defaults", path.display());
            ViewerConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    config.validate()?;
    Ok(config)
}

/// Validates `config` and stores it for the rest of the process.
pub fn init_config(config: ViewerConfig) -> Result<&'static ViewerConfig> {
    config.validate()?;
    CONFIG_CACHE
        .set(config)
        .map_err(|_| ViewerError::InvalidConfig("Config already initialized".to_string()))?;

    let config = get_cached_config()?;
    info!(
        "Config initialized: chunk_size={} window={}+{} step={} every {}ms",
        config.chunk_size,
        config.window_start,
        config.window_size,
        config.animation_increment,
        config.animation_time_ms
    );
    Ok(config)
}

pub fn get_cached_config() -> Result<&'static ViewerConfig> {
    CONFIG_CACHE
        .get()
        .ok_or_else(|| ViewerError::InvalidConfig("Config not initialized".to_string()))
}
