use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::constants::*;
use crate::core::error::{Result, ViewerError};
use crate::core::ingest::{IngestOptions, NanPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window_start: usize,
    pub window_size: usize,
    pub animation_increment: usize,
    pub animation_time_ms: u64,
    pub chunk_size: usize,
    pub downsample_target_points: usize,
    pub frame_interval_ms: u64,
    pub batch_rows: usize,
    pub malformed_numbers: NanPolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_start: DEFAULT_WINDOW_START,
            window_size: DEFAULT_WINDOW_SIZE,
            animation_increment: DEFAULT_ANIMATION_INCREMENT,
            animation_time_ms: DEFAULT_ANIMATION_TIME_MS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            downsample_target_points: DEFAULT_TARGET_POINTS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            batch_rows: DEFAULT_BATCH_ROWS,
            malformed_numbers: NanPolicy::Propagate,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("chunk_size", self.chunk_size),
            ("window_size", self.window_size),
            ("downsample_target_points", self.downsample_target_points),
            ("batch_rows", self.batch_rows),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(ViewerError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    pub fn animation_time(&self) -> Duration {
        Duration::from_millis(self.animation_time_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            chunk_size: self.chunk_size,
            batch_rows: self.batch_rows,
            policy: self.malformed_numbers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "window_size": 50, "malformed_numbers": "drop_row" }"#).unwrap();
        assert_eq!(config.window_size, 50);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.malformed_numbers, NanPolicy::DropRow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = ViewerConfig {
            chunk_size: 0,
            ..ViewerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ViewerError::InvalidConfig(_))));
    }
}
