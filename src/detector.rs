// src/detector.rs - Pose detector seam and the background detection worker
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::error::DetectorError;
use crate::keypoints::HandObservation;
use crate::schedule::RequestId;

/// External hand-pose model. Keypoints come back in the pixel space of the
/// frame passed in.
pub trait HandPoseSource: Send {
    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<HandObservation>, DetectorError>;

    fn name(&self) -> &str {
        "hand-pose"
    }
}

pub type DetectionResult = (RequestId, Result<Vec<HandObservation>, DetectorError>);

/// Issues detection requests without blocking the caller and hands back
/// whatever has finished since the last poll.
pub trait DetectionDispatch {
    fn dispatch(&mut self, id: RequestId, frame: RgbaImage);

    fn poll(&mut self) -> Option<DetectionResult>;
}

/// Runs a [`HandPoseSource`] on tokio's blocking pool.
pub struct DetectionWorker {
    source: Arc<Mutex<Box<dyn HandPoseSource>>>,
    handle: Handle,
    tx: UnboundedSender<DetectionResult>,
    rx: UnboundedReceiver<DetectionResult>,
}

impl DetectionWorker {
    pub fn new(source: Box<dyn HandPoseSource>, handle: Handle) -> Self {
        debug!("Starting detection worker for {}", source.name());
        let (tx, rx) = unbounded_channel();
        Self {
            source: Arc::new(Mutex::new(source)),
            handle,
            tx,
            rx,
        }
    }
}

impl DetectionDispatch for DetectionWorker {
    fn dispatch(&mut self, id: RequestId, frame: RgbaImage) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        self.handle.spawn_blocking(move || {
            let result = match source.lock() {
                Ok(mut source) => catch_unwind(AssertUnwindSafe(|| source.detect(&frame)))
                    .unwrap_or_else(|_| {
                        error!("Hand-pose source panicked on request {}", id.sequence);
                        Err(DetectorError::Inference("detector panicked".into()))
                    }),
                Err(_) => Err(DetectorError::Poisoned),
            };

            if tx.send((id, result)).is_err() {
                debug!("Detection result {} dropped, worker is gone", id.sequence);
            }
        });
    }

    fn poll(&mut self) -> Option<DetectionResult> {
        self.rx.try_recv().ok()
    }
}

/// Runs the source on the calling thread. Results come back on the next
/// poll, so callers see the same one-frame latency as with the worker.
pub struct InlineDispatch {
    source: Box<dyn HandPoseSource>,
    ready: VecDeque<DetectionResult>,
}

impl InlineDispatch {
    pub fn new(source: Box<dyn HandPoseSource>) -> Self {
        debug!("Running {} inline", source.name());
        Self {
            source,
            ready: VecDeque::new(),
        }
    }
}

impl DetectionDispatch for InlineDispatch {
    fn dispatch(&mut self, id: RequestId, frame: RgbaImage) {
        let result = self.source.detect(&frame);
        self.ready.push_back((id, result));
    }

    fn poll(&mut self) -> Option<DetectionResult> {
        self.ready.pop_front()
    }
}
