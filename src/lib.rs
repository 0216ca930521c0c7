// src/lib.rs - Pinch-to-rotate hand tracking core
pub mod config;
pub mod coords;
pub mod detector;
pub mod error;
pub mod frame_loop;
pub mod grid;
pub mod keypoints;
pub mod pinch;
pub mod schedule;
pub mod session;
pub mod signal;
pub mod simulation;
pub mod slots;
pub mod smoothing;

pub use config::WallConfig;
pub use error::{ConfigError, DetectorError, ObservationError};
pub use frame_loop::{FrameLoop, TickReport};
pub use session::{PinchEvent, Session};
