// src/coords.rs - Scale reconciliation between capture, processing and display buffers
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        let res = Self { width, height };
        res.validate("buffer")?;
        Ok(res)
    }

    /// For constants known to be non-zero; [`CoordinateMapper`] still
    /// validates whatever it is given.
    pub const fn new_unchecked(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidResolution {
                name,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn as_vector(&self) -> Vector2<f64> {
        Vector2::new(self.width as f64, self.height as f64)
    }
}

/// The pixel spaces a point can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    Capture,
    Processing,
    Display,
}

impl Space {
    pub const ALL: [Space; 3] = [Space::Capture, Space::Processing, Space::Display];

    fn index(self) -> usize {
        match self {
            Space::Capture => 0,
            Space::Processing => 1,
            Space::Display => 2,
        }
    }
}

/// Per-axis scale factors between every pair of spaces.
///
/// The table is rebuilt on every [`CoordinateMapper::resize`], so a lookup
/// never sees factors from an older buffer size.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    resolutions: [Resolution; 3],
    scales: [[Vector2<f64>; 3]; 3],
}

impl CoordinateMapper {
    pub fn new(
        capture: Resolution,
        processing: Resolution,
        display: Resolution,
    ) -> Result<Self, ConfigError> {
        capture.validate("capture")?;
        processing.validate("processing")?;
        display.validate("display")?;

        let mut mapper = Self {
            resolutions: [capture, processing, display],
            scales: [[Vector2::new(1.0, 1.0); 3]; 3],
        };
        mapper.recompute();
        Ok(mapper)
    }

    pub fn resolution(&self, space: Space) -> Resolution {
        self.resolutions[space.index()]
    }

    /// Updates one buffer's size and recomputes every factor. Returns
    /// `Ok(false)` when the size did not change.
    pub fn resize(&mut self, space: Space, resolution: Resolution) -> Result<bool, ConfigError> {
        resolution.validate("resized")?;
        if self.resolutions[space.index()] == resolution {
            return Ok(false);
        }

        debug!(
            "Resizing {:?} buffer to {}x{}",
            space, resolution.width, resolution.height
        );
        self.resolutions[space.index()] = resolution;
        self.recompute();
        Ok(true)
    }

    fn recompute(&mut self) {
        for from in Space::ALL {
            for to in Space::ALL {
                let src = self.resolutions[from.index()].as_vector();
                let dst = self.resolutions[to.index()].as_vector();
                self.scales[from.index()][to.index()] = dst.component_div(&src);
            }
        }
    }

    pub fn scale(&self, from: Space, to: Space) -> Vector2<f64> {
        self.scales[from.index()][to.index()]
    }

    pub fn convert(&self, point: Point2<f64>, from: Space, to: Space) -> Point2<f64> {
        let scale = self.scale(from, to);
        Point2::new(point.x * scale.x, point.y * scale.y)
    }

    pub fn to_display(&self, point: Point2<f64>, from: Space) -> Point2<f64> {
        self.convert(point, from, Space::Display)
    }

    /// Scales a length measured along the x axis, e.g. a pinch radius.
    pub fn convert_length(&self, length: f64, from: Space, to: Space) -> f64 {
        length * self.scale(from, to).x
    }
}
