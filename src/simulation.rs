// src/simulation.rs - Synthetic hands for running without a camera or pose model
use image::RgbaImage;

use crate::detector::HandPoseSource;
use crate::error::DetectorError;
use crate::keypoints::{HandObservation, Keypoint, INDEX_TIP, KEYPOINT_COUNT, THUMB_TIP};

// Offsets from the wrist of an upright open hand, in pixels at scale 1.
const HAND_TEMPLATE: [(f64, f64); KEYPOINT_COUNT] = [
    (0.0, 0.0),     // wrist
    (-12.0, -8.0),  // thumb cmc
    (-20.0, -16.0),
    (-24.0, -26.0),
    (-16.0, -50.0), // thumb tip, replaced below
    (-8.0, -40.0),  // index base
    (-8.0, -52.0),
    (-8.0, -60.0),
    (-16.0, -50.0), // index tip, replaced below
    (0.0, -42.0),   // middle base
    (0.0, -56.0),
    (0.0, -64.0),
    (0.0, -70.0),
    (8.0, -40.0),
    (8.0, -52.0),
    (8.0, -60.0),
    (8.0, -66.0),
    (16.0, -32.0),  // pinky base
    (16.0, -42.0),
    (16.0, -48.0),
    (16.0, -52.0),
];

// Thumb and index tips straddle this point.
const PINCH_CENTRE: (f64, f64) = (-16.0, -50.0);

/// Builds a hand with its wrist at `wrist`, template offsets multiplied by
/// `scale`, and thumb/index tips `pinch_gap` pixels apart.
pub fn synthetic_hand(wrist: Keypoint, scale: f64, pinch_gap: f64) -> HandObservation {
    let mut keypoints = [Keypoint::origin(); KEYPOINT_COUNT];
    for (point, &(dx, dy)) in keypoints.iter_mut().zip(HAND_TEMPLATE.iter()) {
        *point = Keypoint::new(wrist.x + dx * scale, wrist.y + dy * scale);
    }

    let centre = Keypoint::new(
        wrist.x + PINCH_CENTRE.0 * scale,
        wrist.y + PINCH_CENTRE.1 * scale,
    );
    keypoints[THUMB_TIP] = Keypoint::new(centre.x - pinch_gap / 2.0, centre.y);
    keypoints[INDEX_TIP] = Keypoint::new(centre.x + pinch_gap / 2.0, centre.y);
    HandObservation::new(keypoints)
}

/// Deterministic stand-in for a pose model: one or two hands drifting over
/// the frame and pinching every few seconds.
pub struct SimulatedHands {
    hand_count: usize,
    time: f64,
    step: f64,
    calls: u64,
    fail_every: Option<u64>,
}

impl SimulatedHands {
    pub fn new(hand_count: usize) -> Self {
        Self {
            hand_count: hand_count.clamp(1, 2),
            time: 0.0,
            // Detection runs every 5th frame at ~60 fps.
            step: 5.0 / 60.0,
            calls: 0,
            fail_every: None,
        }
    }

    /// Seconds of simulated time per detect call.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Every `n`th call fails, to exercise the error path.
    pub fn with_failures(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    fn hand_at(&self, index: usize, width: f64, height: f64) -> HandObservation {
        let t = self.time;
        let phase = index as f64 * std::f64::consts::PI;
        let scale = height / 240.0;

        let wrist = Keypoint::new(
            width * (0.5 + 0.22 * (0.37 * t + phase).sin()) + 12.8 * scale,
            height * (0.55 + 0.2 * (0.23 * t + index as f64).sin()),
        );

        let open_gap = 30.0 * scale;
        let pinch_gap = open_gap * (0.5 + 0.5 * (1.1 * t + index as f64 * 2.0).sin());
        synthetic_hand(wrist, scale, pinch_gap)
    }

    fn visible_hands(&self) -> usize {
        if self.hand_count == 2 && (0.17 * self.time).sin() > -0.5 {
            2
        } else {
            1
        }
    }
}

impl HandPoseSource for SimulatedHands {
    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<HandObservation>, DetectorError> {
        self.calls += 1;
        self.time += self.step;

        if let Some(n) = self.fail_every {
            if self.calls % n == 0 {
                return Err(DetectorError::Inference("simulated dropout".into()));
            }
        }
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectorError::NotReady);
        }

        let (width, height) = (frame.width() as f64, frame.height() as f64);
        Ok((0..self.visible_hands())
            .map(|i| self.hand_at(i, width, height))
            .collect())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
