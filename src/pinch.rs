// src/pinch.rs - Debounced pinch edge detection per hand slot
use std::time::Duration;

use crate::grid::CellIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Idle,
    PinchActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchTransition {
    Started,
    Released,
}

#[derive(Debug, Clone)]
pub struct PinchTracker {
    phase: PinchPhase,
    last_pinch: Option<Duration>,
    last_cell: Option<CellIndex>,
    debounce: Duration,
}

impl PinchTracker {
    pub fn new(debounce: Duration) -> Self {
        Self {
            phase: PinchPhase::Idle,
            last_pinch: None,
            last_cell: None,
            debounce,
        }
    }

    pub fn phase(&self) -> PinchPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == PinchPhase::PinchActive
    }

    pub fn last_pinch(&self) -> Option<Duration> {
        self.last_pinch
    }

    pub fn last_cell(&self) -> Option<CellIndex> {
        self.last_cell
    }

    pub fn set_last_cell(&mut self, cell: Option<CellIndex>) {
        self.last_cell = cell;
    }

    fn debounce_elapsed(&self, now: Duration) -> bool {
        match self.last_pinch {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.debounce,
        }
    }

    /// Feeds one smoothed comparison. Starting needs the debounce window to
    /// have passed since the previous start; releasing is immediate.
    pub fn update(&mut self, below_threshold: bool, now: Duration) -> Option<PinchTransition> {
        match (self.phase, below_threshold) {
            (PinchPhase::Idle, true) if self.debounce_elapsed(now) => {
                self.phase = PinchPhase::PinchActive;
                self.last_pinch = Some(now);
                Some(PinchTransition::Started)
            }
            (PinchPhase::PinchActive, false) => {
                self.phase = PinchPhase::Idle;
                Some(PinchTransition::Released)
            }
            _ => None,
        }
    }

    /// Forces the slot back to idle, keeping the debounce history.
    pub fn release(&mut self) -> Option<PinchTransition> {
        if self.is_active() {
            self.phase = PinchPhase::Idle;
            Some(PinchTransition::Released)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.debounce);
    }
}
