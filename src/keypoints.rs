// src/keypoints.rs - Fixed-shape 21-point hand observations
use nalgebra::Point2;

use crate::error::ObservationError;

pub type Keypoint = Point2<f64>;

/// Number of keypoints the pose model reports per hand.
pub const KEYPOINT_COUNT: usize = 21;

// MediaPipe hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_TIP: usize = 4;
pub const INDEX_BASE: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_BASE: usize = 9;
pub const PINKY_BASE: usize = 17;

/// Bone connections of the 21-point hand, wrist outwards per finger.
#[rustfmt::skip]
pub const SKELETON: [(usize, usize); 20] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (0, 9), (9, 10), (10, 11), (11, 12),
    (0, 13), (13, 14), (14, 15), (15, 16),
    (0, 17), (17, 18), (18, 19), (19, 20),
];

/// One detected hand in processing-resolution pixels.
///
/// Replaced wholesale every detection cycle; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    keypoints: [Keypoint; KEYPOINT_COUNT],
}

impl HandObservation {
    pub fn new(keypoints: [Keypoint; KEYPOINT_COUNT]) -> Self {
        Self { keypoints }
    }

    /// Builds an observation from loosely shaped detector output.
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self, ObservationError> {
        if points.len() != KEYPOINT_COUNT {
            return Err(ObservationError::WrongKeypointCount {
                expected: KEYPOINT_COUNT,
                actual: points.len(),
            });
        }

        let mut keypoints = [Keypoint::origin(); KEYPOINT_COUNT];
        for (slot, &(x, y)) in keypoints.iter_mut().zip(points) {
            *slot = Keypoint::new(x, y);
        }
        Ok(Self { keypoints })
    }

    pub fn keypoint(&self, index: usize) -> Keypoint {
        self.keypoints[index]
    }

    pub fn keypoints(&self) -> &[Keypoint; KEYPOINT_COUNT] {
        &self.keypoints
    }

    pub fn wrist(&self) -> Keypoint {
        self.keypoints[WRIST]
    }

    pub fn thumb_tip(&self) -> Keypoint {
        self.keypoints[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Keypoint {
        self.keypoints[INDEX_TIP]
    }

    /// Midpoint between thumb tip and index tip.
    pub fn pinch_midpoint(&self) -> Keypoint {
        nalgebra::center(&self.thumb_tip(), &self.index_tip())
    }

    pub fn is_finite(&self) -> bool {
        self.keypoints
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Same hand shape shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut keypoints = self.keypoints;
        for p in keypoints.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
        Self { keypoints }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::simulation::synthetic_hand;

    /// Unscaled synthetic hand: wrist at `(x, y)`, midpoint of the pinch
    /// at `(x - 16, y - 50)`.
    pub fn open_hand(x: f64, y: f64, pinch_gap: f64) -> HandObservation {
        synthetic_hand(Keypoint::new(x, y), 1.0, pinch_gap)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::open_hand;
    use super::*;

    #[test]
    fn rejects_short_keypoint_lists() {
        let err = HandObservation::from_points(&[(0.0, 0.0); 20]).unwrap_err();
        assert_eq!(
            err,
            ObservationError::WrongKeypointCount {
                expected: 21,
                actual: 20
            }
        );
    }

    #[test]
    fn midpoint_sits_between_thumb_and_index() {
        let hand = open_hand(100.0, 100.0, 10.0);
        let mid = hand.pinch_midpoint();
        assert_eq!(mid, Keypoint::new(84.0, 50.0));
    }

    #[test]
    fn skeleton_reaches_every_keypoint() {
        let mut seen = [false; KEYPOINT_COUNT];
        for (a, b) in SKELETON {
            seen[a] = true;
            seen[b] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
