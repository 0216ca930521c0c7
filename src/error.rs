// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} resolution must be non-zero, got {width}x{height}")]
    InvalidResolution {
        name: &'static str,
        width: u32,
        height: u32,
    },

    #[error("smoothing window must hold at least one sample")]
    EmptyWindow,

    #[error("grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("detection interval must be at least one frame")]
    ZeroDetectionInterval,

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("failed to read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ObservationError {
    #[error("hand observation needs exactly {expected} keypoints, got {actual}")]
    WrongKeypointCount { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("pose detector is not ready")]
    NotReady,

    #[error("pose detector failed: {0}")]
    Inference(String),

    #[error("pose detector lock was poisoned")]
    Poisoned,
}
