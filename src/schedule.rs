// src/schedule.rs - Clocks and throttled, single-flight detection requests
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::DetectorError;
use crate::keypoints::HandObservation;

/// Monotonic time since the session started.
pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.micros
            .fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, to: Duration) {
        self.micros.store(to.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId {
    pub generation: u64,
    pub sequence: u64,
}

/// What to do with a finished detection.
#[derive(Debug)]
pub enum Completion {
    /// Newest result of the current generation; apply it.
    Fresh(Vec<HandObservation>),
    /// Detector failed; keep the previous hands.
    Failed(DetectorError),
    /// Superseded or from before a reset; drop it.
    Stale,
}

#[derive(Debug, Clone)]
pub struct DetectionScheduler {
    interval: u32,
    frame_count: u64,
    generation: u64,
    next_sequence: u64,
    in_flight: Option<RequestId>,
    last_applied: Option<RequestId>,
    skipped: u64,
}

impl DetectionScheduler {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            frame_count: 0,
            generation: 0,
            next_sequence: 0,
            in_flight: None,
            last_applied: None,
            skipped: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    /// Detection slots that came up while a request was still outstanding.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Counts one rendered frame and returns a request id when a detection
    /// should be issued now.
    pub fn on_frame(&mut self) -> Option<RequestId> {
        self.frame_count += 1;
        if self.frame_count % self.interval as u64 != 0 {
            return None;
        }

        if let Some(pending) = self.in_flight {
            self.skipped += 1;
            debug!(
                "Skipping detection on frame {}: request {} still in flight",
                self.frame_count, pending.sequence
            );
            return None;
        }

        let id = RequestId {
            generation: self.generation,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.in_flight = Some(id);
        Some(id)
    }

    pub fn complete(
        &mut self,
        id: RequestId,
        result: Result<Vec<HandObservation>, DetectorError>,
    ) -> Completion {
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }

        let newer = self.last_applied.map_or(true, |last| id > last);
        if id.generation != self.generation || !newer {
            debug!("Dropping stale detection result {:?}", id);
            return Completion::Stale;
        }

        match result {
            Ok(hands) => {
                self.last_applied = Some(id);
                Completion::Fresh(hands)
            }
            Err(e) => {
                warn!("Hand detection failed: {}", e);
                Completion::Failed(e)
            }
        }
    }

    /// Invalidates any outstanding request; its result will be dropped.
    /// The request still occupies the single in-flight slot until it
    /// completes, so no second detection is queued behind it.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.last_applied = None;
    }
}
