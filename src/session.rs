// src/session.rs - Per-session state: slots, grid and coordinate mapping
use std::time::Duration;

use chrono::{DateTime, Local};
use nalgebra::Point2;
use serde::Serialize;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::config::WallConfig;
use crate::coords::{CoordinateMapper, Resolution, Space};
use crate::error::ConfigError;
use crate::grid::{CellIndex, GridEngine, GridFrame};
use crate::keypoints::HandObservation;
use crate::pinch::{PinchTracker, PinchTransition};
use crate::signal::SignalSample;
use crate::slots::{SlotAssigner, MAX_HANDS};
use crate::smoothing::SignalWindows;

/// Emitted once per `Idle -> PinchActive` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PinchEvent {
    pub slot: usize,
    /// Gesture midpoint in display pixels.
    pub midpoint: Point2<f64>,
    /// Cell that was rotated, if the midpoint was on the wall.
    pub cell: Option<CellIndex>,
    pub at: Duration,
}

/// Everything kept for one tracking lane between frames.
#[derive(Debug, Clone)]
pub struct SlotContext {
    windows: SignalWindows,
    tracker: PinchTracker,
    observation: Option<HandObservation>,
    raw: Option<SignalSample>,
    smoothed: Option<SignalSample>,
    threshold: Option<f64>,
}

impl SlotContext {
    fn new(window: usize, debounce: Duration) -> Self {
        Self {
            windows: SignalWindows::new(window),
            tracker: PinchTracker::new(debounce),
            observation: None,
            raw: None,
            smoothed: None,
            threshold: None,
        }
    }

    pub fn observation(&self) -> Option<&HandObservation> {
        self.observation.as_ref()
    }

    pub fn raw(&self) -> Option<SignalSample> {
        self.raw
    }

    pub fn smoothed(&self) -> Option<SignalSample> {
        self.smoothed
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn tracker(&self) -> &PinchTracker {
        &self.tracker
    }

    pub fn windows(&self) -> &SignalWindows {
        &self.windows
    }

    fn forget_observation(&mut self) {
        self.observation = None;
        self.raw = None;
        self.smoothed = None;
        self.threshold = None;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub started_at: String,
    pub detections_applied: u64,
    pub pinch_count: u64,
    pub rotations_applied: u64,
}

pub struct Session {
    id: Uuid,
    started_at: DateTime<Local>,
    config: WallConfig,
    mapper: CoordinateMapper,
    grid: GridEngine,
    assigner: SlotAssigner,
    slots: [SlotContext; MAX_HANDS],
    detections_applied: u64,
    pinch_count: u64,
    rotations_applied: u64,
}

impl Session {
    pub fn new(config: WallConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let video = &config.video;
        let mapper = CoordinateMapper::new(video.capture, video.processing, video.display)?;
        let grid = GridEngine::new(config.grid.clone(), video.display);
        let assigner = SlotAssigner::new(config.tracking.slot_policy);
        let slots = Self::fresh_slots(&config);

        let session = Self {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            config,
            mapper,
            grid,
            assigner,
            slots,
            detections_applied: 0,
            pinch_count: 0,
            rotations_applied: 0,
        };
        info!(
            "Session {} started: {}x{} grid, {:?} slots",
            session.id,
            session.config.grid.rows,
            session.config.grid.cols,
            session.config.tracking.slot_policy
        );
        Ok(session)
    }

    fn fresh_slots(config: &WallConfig) -> [SlotContext; MAX_HANDS] {
        let debounce = Duration::from_millis(config.tracking.debounce_ms);
        let window = config.tracking.smoothing_window;
        [
            SlotContext::new(window, debounce),
            SlotContext::new(window, debounce),
        ]
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &WallConfig {
        &self.config
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn grid(&self) -> &GridEngine {
        &self.grid
    }

    /// `None` for slots at or beyond [`MAX_HANDS`].
    pub fn slot(&self, slot: usize) -> Option<&SlotContext> {
        self.slots.get(slot)
    }

    pub fn slots(&self) -> &[SlotContext; MAX_HANDS] {
        &self.slots
    }

    pub fn pinch_count(&self) -> u64 {
        self.pinch_count
    }

    /// Runs the gesture pipeline over one applied detection result.
    pub fn ingest(&mut self, hands: Vec<HandObservation>, now: Duration) -> Vec<PinchEvent> {
        let span = info_span!("ingest", session = %self.id);
        let _enter = span.enter();

        self.detections_applied += 1;
        let assignment = self.assigner.assign(hands);

        let mut events = Vec::new();
        for (slot, observation) in assignment.into_iter().enumerate() {
            if let Some(event) = self.process_slot(slot, observation, now) {
                events.push(event);
            }
        }
        events
    }

    fn process_slot(
        &mut self,
        slot: usize,
        observation: Option<HandObservation>,
        now: Duration,
    ) -> Option<PinchEvent> {
        let Some(hand) = observation else {
            self.handle_loss(slot);
            return None;
        };
        let sample = SignalSample::from_observation(&hand);
        if sample.is_absent() {
            debug!("Slot {} observation has unusable keypoints", slot);
            self.handle_loss(slot);
            return None;
        }

        let policy = self.config.tracking.threshold;
        let midpoint = self
            .mapper
            .to_display(hand.pinch_midpoint(), Space::Processing);

        let context = &mut self.slots[slot];
        let smoothed = context.windows.push_sample(sample);
        let threshold = policy.threshold(smoothed.hand_size);
        context.raw = Some(sample);
        context.smoothed = Some(smoothed);
        context.threshold = Some(threshold);
        context.observation = Some(hand);

        match context.tracker.update(smoothed.pinch_distance < threshold, now) {
            Some(PinchTransition::Started) => {
                let cell = self.grid.on_pinch_start(midpoint, slot);
                self.slots[slot].tracker.set_last_cell(cell);
                self.pinch_count += 1;
                if cell.is_some() {
                    self.rotations_applied += 1;
                }
                info!(
                    "Pinch start on slot {} at ({:.0}, {:.0}) -> {:?}",
                    slot, midpoint.x, midpoint.y, cell
                );
                Some(PinchEvent {
                    slot,
                    midpoint,
                    cell,
                    at: now,
                })
            }
            Some(PinchTransition::Released) => {
                debug!("Pinch released on slot {}", slot);
                None
            }
            None => None,
        }
    }

    fn handle_loss(&mut self, slot: usize) {
        let reset = self.config.tracking.reset_on_loss;
        let context = &mut self.slots[slot];
        let had_hand = context.observation.is_some();
        context.forget_observation();

        if reset {
            context.windows.clear();
            if context.tracker.release().is_some() {
                debug!("Slot {} lost its hand mid-pinch, released", slot);
            }
        }
        if had_hand {
            debug!("Slot {} lost its hand", slot);
        }
    }

    /// Advances per-frame timers.
    pub fn tick(&mut self, dt: Duration) {
        self.grid.tick(dt);
    }

    /// Must be called before the next frame whenever a buffer changes size.
    pub fn resize(&mut self, space: Space, resolution: Resolution) -> Result<bool, ConfigError> {
        let changed = self.mapper.resize(space, resolution)?;
        if changed && space == Space::Display {
            self.grid.relayout(resolution);
        }
        Ok(changed)
    }

    pub fn grid_frame(&self) -> GridFrame {
        self.grid.frame(self.mapper.resolution(Space::Display))
    }

    /// Clears slots and grid; counters and identity are kept.
    pub fn reset(&mut self) {
        info!("Session {} reset", self.id);
        self.slots = Self::fresh_slots(&self.config);
        self.assigner.reset();
        self.grid.reset();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.to_string(),
            started_at: self.started_at.to_rfc3339(),
            detections_applied: self.detections_applied,
            pinch_count: self.pinch_count,
            rotations_applied: self.rotations_applied,
        }
    }
}
