// src/config.rs
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::coords::Resolution;
use crate::error::ConfigError;
use crate::grid::SpinPolicy;
use crate::signal::ThresholdPolicy;
use crate::slots::SlotPolicy;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub tracking: TrackingConfig,
    pub grid: GridConfig,
    pub video: VideoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Run pose detection once every this many rendered frames.
    pub detection_interval: u32,
    pub smoothing_window: usize,
    pub debounce_ms: u64,
    pub threshold: ThresholdPolicy,
    pub slot_policy: SlotPolicy,
    /// Release the pinch and drop smoothing history when a slot loses its hand.
    pub reset_on_loss: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            detection_interval: 5,
            smoothing_window: 5,
            debounce_ms: 300,
            threshold: ThresholdPolicy::default(),
            slot_policy: SlotPolicy::NearestNeighbor,
            reset_on_loss: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub step_degrees: f64,
    pub spin: SpinPolicy,
    pub flash_ms: u64,
    /// Flash overlay alpha right after a rotation, 0-255.
    pub flash_peak_alpha: u8,
    pub top_margin: f64,
    /// Space left under the grid so the whole hand stays in view.
    pub bottom_margin: f64,
    pub gap: f64,
    pub mirror_columns: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 4,
            step_degrees: 90.0,
            spin: SpinPolicy::Uniform,
            flash_ms: 200,
            flash_peak_alpha: 200,
            top_margin: 40.0,
            bottom_margin: 200.0,
            gap: 0.0,
            mirror_columns: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub capture: Resolution,
    /// Downscaled frame size handed to the pose detector.
    pub processing: Resolution,
    pub display: Resolution,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            capture: Resolution::new_unchecked(1280, 720),
            processing: Resolution::new_unchecked(256, 192),
            display: Resolution::new_unchecked(960, 720),
        }
    }
}

impl WallConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path first, then the platform config directory, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Like [`WallConfig::load`], but falls back to defaults on any error.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        Self::load(explicit).unwrap_or_else(|e| {
            warn!("Ignoring config: {}", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.video.capture.validate("capture")?;
        self.video.processing.validate("processing")?;
        self.video.display.validate("display")?;

        if self.tracking.smoothing_window == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.tracking.detection_interval == 0 {
            return Err(ConfigError::ZeroDetectionInterval);
        }
        self.tracking.threshold.validate()?;

        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.grid.rows,
                cols: self.grid.cols,
            });
        }
        if !(self.grid.step_degrees.is_finite() && self.grid.step_degrees > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "step_degrees",
                value: self.grid.step_degrees,
            });
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "pinchwall", "PinchWall")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        WallConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: WallConfig =
            serde_json::from_str(r#"{ "grid": { "rows": 10, "cols": 10 } }"#).unwrap();
        assert_eq!(config.grid.rows, 10);
        assert_eq!(config.grid.step_degrees, 90.0);
        assert_eq!(config.tracking.debounce_ms, 300);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_zero_window() {
        let mut config = WallConfig::default();
        config.tracking.smoothing_window = 0;
        assert!(matches!(config.validate(), Err(ConfigError::EmptyWindow)));
    }

    #[test]
    fn rejects_zero_processing_resolution() {
        let mut config = WallConfig::default();
        config.video.processing = Resolution::new_unchecked(0, 192);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidResolution { name: "processing", .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = WallConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
