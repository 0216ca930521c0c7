// src/frame_loop.rs - Per-frame driver: apply results, advance timers, throttle detection
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{trace, warn};

use crate::coords::{Resolution, Space};
use crate::detector::DetectionDispatch;
use crate::schedule::{Clock, Completion, DetectionScheduler, RequestId};
use crate::session::{PinchEvent, Session};

/// What happened during one rendered frame.
#[derive(Debug, Default)]
pub struct TickReport {
    pub dt: Duration,
    pub events: Vec<PinchEvent>,
    /// Detection results applied to the session this frame.
    pub applied: usize,
    pub failures: usize,
    pub dispatched: Option<RequestId>,
}

pub struct FrameLoop<C: Clock, D: DetectionDispatch> {
    clock: C,
    dispatch: D,
    scheduler: DetectionScheduler,
    session: Session,
    last_tick: Option<Duration>,
}

impl<C: Clock, D: DetectionDispatch> FrameLoop<C, D> {
    pub fn new(session: Session, clock: C, dispatch: D) -> Self {
        let scheduler = DetectionScheduler::new(session.config().tracking.detection_interval);
        Self {
            clock,
            dispatch,
            scheduler,
            session,
            last_tick: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn scheduler(&self) -> &DetectionScheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Runs one frame. Results that arrived since the last frame are applied
    /// before timers advance, and a new request goes out last.
    pub fn tick(&mut self, frame: &RgbaImage) -> TickReport {
        let now = self.clock.now();
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_tick = Some(now);

        let mut report = TickReport {
            dt,
            ..TickReport::default()
        };

        while let Some((id, result)) = self.dispatch.poll() {
            match self.scheduler.complete(id, result) {
                Completion::Fresh(hands) => {
                    report.events.extend(self.session.ingest(hands, now));
                    report.applied += 1;
                }
                Completion::Failed(_) => report.failures += 1,
                Completion::Stale => {}
            }
        }

        self.session.tick(dt);

        let capture = match Resolution::new(frame.width(), frame.height()) {
            Ok(capture) => capture,
            Err(_) => {
                trace!("Empty frame, skipping detection");
                return report;
            }
        };
        if let Err(e) = self.session.resize(Space::Capture, capture) {
            warn!("Ignoring capture resize: {}", e);
        }

        if let Some(id) = self.scheduler.on_frame() {
            let input = self.downscale(frame);
            self.dispatch.dispatch(id, input);
            report.dispatched = Some(id);
        }
        report
    }

    fn downscale(&self, frame: &RgbaImage) -> RgbaImage {
        let target = self.session.mapper().resolution(Space::Processing);
        if frame.width() == target.width && frame.height() == target.height {
            return frame.clone();
        }
        imageops::resize(frame, target.width, target.height, FilterType::Nearest)
    }

    /// Forwards a buffer size change to the session. A new processing size
    /// also invalidates the outstanding request, whose keypoints are in the
    /// old processing space.
    pub fn resize(&mut self, space: Space, resolution: Resolution) -> bool {
        match self.session.resize(space, resolution) {
            Ok(changed) => {
                if changed && space == Space::Processing {
                    self.scheduler.reset();
                }
                changed
            }
            Err(e) => {
                warn!("Ignoring {:?} resize: {}", space, e);
                false
            }
        }
    }

    /// Clears session state and invalidates any outstanding detection.
    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.session.reset();
    }
}
