// src/signal.rs - Per-hand scale and pinch measurements
use nalgebra::distance;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::keypoints::{
    HandObservation, INDEX_BASE, INDEX_TIP, PINKY_BASE, THUMB_CMC, THUMB_TIP, WRIST,
};

/// Raw measurements taken from one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSample {
    /// Mean wrist-to-knuckle distance; a proxy for distance to the camera.
    pub hand_size: f64,
    /// Thumb tip to index tip.
    pub pinch_distance: f64,
}

impl SignalSample {
    /// Sentinel for "no pinch possible this frame".
    pub const ABSENT: SignalSample = SignalSample {
        hand_size: 0.0,
        pinch_distance: f64::INFINITY,
    };

    pub fn from_observation(hand: &HandObservation) -> Self {
        let wrist = hand.keypoint(WRIST);
        let index_base = hand.keypoint(INDEX_BASE);
        let pinky_base = hand.keypoint(PINKY_BASE);
        let thumb_tip = hand.keypoint(THUMB_TIP);
        let index_tip = hand.keypoint(INDEX_TIP);

        let hand_size = (distance(&wrist, &index_base) + distance(&wrist, &pinky_base)) / 2.0;
        let pinch_distance = distance(&thumb_tip, &index_tip);

        if !hand_size.is_finite() || !pinch_distance.is_finite() {
            return Self::ABSENT;
        }
        Self {
            hand_size,
            pinch_distance,
        }
    }

    pub fn is_absent(&self) -> bool {
        !self.pinch_distance.is_finite()
    }
}

/// Which smoothed signal a window holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    HandSize,
    PinchDistance,
}

const NORMALIZE_EXPONENT: f64 = 1.7;

/// Pinch distance normalized against hand size.
pub fn normalized_pinch(sample: &SignalSample) -> f64 {
    sample.pinch_distance / sample.hand_size.max(1.0).powf(NORMALIZE_EXPONENT) * 1000.0
}

/// How the pinch threshold is derived from the smoothed hand size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// `threshold = offset_ratio * hand_size / divisor`.
    ///
    /// With the defaults this equals `map(size, 50, 200, 20, 80) / 1.25`,
    /// i.e. `0.32 * hand_size`, so it holds in any pixel space.
    HandScaled { offset_ratio: f64, divisor: f64 },
    /// Constant pixel distance, regardless of hand size.
    Fixed { distance: f64 },
    /// Compares `pinch / max(hand_size, 1)^1.7 * 1000` against `constant`,
    /// expressed here as the equivalent raw-distance threshold.
    Normalized { constant: f64 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::HandScaled {
            offset_ratio: 0.4,
            divisor: 1.25,
        }
    }
}

impl ThresholdPolicy {
    pub fn threshold(&self, smoothed_hand_size: f64) -> f64 {
        match *self {
            ThresholdPolicy::HandScaled {
                offset_ratio,
                divisor,
            } => (offset_ratio * smoothed_hand_size / divisor).max(0.0),
            ThresholdPolicy::Fixed { distance } => distance,
            ThresholdPolicy::Normalized { constant } => {
                constant * smoothed_hand_size.max(1.0).powf(NORMALIZE_EXPONENT) / 1000.0
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: Vec<(&'static str, f64)> = match *self {
            ThresholdPolicy::HandScaled {
                offset_ratio,
                divisor,
            } => vec![("offset_ratio", offset_ratio), ("divisor", divisor)],
            ThresholdPolicy::Fixed { distance } => vec![("distance", distance)],
            ThresholdPolicy::Normalized { constant } => vec![("constant", constant)],
        };
        for (name, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// Classifies a hand from the winding of wrist, thumb base and pinky base.
///
/// Assumes the detector already mirrored the frame, as a selfie view does.
pub fn classify_handedness(hand: &HandObservation) -> Handedness {
    let wrist = hand.keypoint(WRIST);
    let to_thumb = hand.keypoint(THUMB_CMC) - wrist;
    let to_pinky = hand.keypoint(PINKY_BASE) - wrist;
    let cross = to_thumb.x * to_pinky.y - to_thumb.y * to_pinky.x;

    if cross > 0.0 {
        Handedness::Left
    } else {
        Handedness::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::fixtures::open_hand;
    use crate::keypoints::Keypoint;

    #[test]
    fn hand_size_averages_both_knuckles() {
        let hand = open_hand(0.0, 0.0, 10.0);
        let sample = SignalSample::from_observation(&hand);
        let to_index = (8.0f64 * 8.0 + 40.0 * 40.0).sqrt();
        let to_pinky = (16.0f64 * 16.0 + 32.0 * 32.0).sqrt();
        let expected = (to_index + to_pinky) / 2.0;
        assert!((sample.hand_size - expected).abs() < 1e-9);
        assert!((sample.pinch_distance - 10.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_keypoints_give_absent_sample() {
        let mut points: Vec<(f64, f64)> = open_hand(0.0, 0.0, 4.0)
            .keypoints()
            .iter()
            .map(|p| (p.x, p.y))
            .collect();
        points[THUMB_TIP] = (f64::NAN, 0.0);
        let hand = HandObservation::from_points(&points).unwrap();

        let sample = SignalSample::from_observation(&hand);
        assert!(sample.is_absent());
        assert_eq!(sample.hand_size, 0.0);
    }

    #[test]
    fn hand_scaled_threshold_matches_mapped_offset() {
        let policy = ThresholdPolicy::default();
        // map(100, 50, 200, 20, 80) = 40, / 1.25 = 32
        assert!((policy.threshold(100.0) - 32.0).abs() < 1e-9);
        assert_eq!(policy.threshold(0.0), 0.0);
    }

    #[test]
    fn fixed_threshold_ignores_hand_size() {
        let policy = ThresholdPolicy::Fixed { distance: 20.0 };
        assert_eq!(policy.threshold(5.0), 20.0);
        assert_eq!(policy.threshold(500.0), 20.0);
    }

    #[test]
    fn normalized_threshold_agrees_with_normalized_pinch() {
        let policy = ThresholdPolicy::Normalized { constant: 10.0 };
        assert!((policy.threshold(100.0) - 10.0 * 100f64.powf(1.7) / 1000.0).abs() < 1e-9);
        // Tiny hands are clamped to size 1.
        assert!((policy.threshold(0.2) - 0.01).abs() < 1e-12);

        // Hand size ~38.3 gives a raw threshold of ~4.9 px.
        let hand = open_hand(0.0, 0.0, 4.0);
        let sample = SignalSample::from_observation(&hand);
        let threshold = policy.threshold(sample.hand_size);
        assert!(normalized_pinch(&sample) < 10.0);
        assert!(sample.pinch_distance < threshold);

        let wide = SignalSample {
            pinch_distance: threshold * 1.01,
            ..sample
        };
        assert!(normalized_pinch(&wide) > 10.0);
    }

    #[test]
    fn normalized_policy_loads_from_json() {
        let policy: ThresholdPolicy =
            serde_json::from_str(r#"{ "kind": "normalized", "constant": 12.5 }"#).unwrap();
        assert_eq!(policy, ThresholdPolicy::Normalized { constant: 12.5 });
        assert!(ThresholdPolicy::Normalized { constant: 0.0 }.validate().is_err());
    }

    #[test]
    fn threshold_policy_rejects_zero_divisor() {
        let policy = ThresholdPolicy::HandScaled {
            offset_ratio: 0.4,
            divisor: 0.0,
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn handedness_flips_with_mirroring() {
        let hand = open_hand(50.0, 50.0, 10.0);
        let mirrored: Vec<(f64, f64)> = hand
            .keypoints()
            .iter()
            .map(|p: &Keypoint| (100.0 - p.x, p.y))
            .collect();
        let mirrored = HandObservation::from_points(&mirrored).unwrap();

        assert_ne!(classify_handedness(&hand), classify_handedness(&mirrored));
    }
}
