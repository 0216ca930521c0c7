// src/smoothing.rs - Sliding-window averages that damp detector jitter
use std::collections::VecDeque;

use crate::signal::{Signal, SignalSample};

/// Fixed-capacity FIFO whose value is the mean of what it holds.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SmoothingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Arithmetic mean of the window, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// The pair of windows kept for one hand slot.
#[derive(Debug, Clone)]
pub struct SignalWindows {
    hand_size: SmoothingWindow,
    pinch_distance: SmoothingWindow,
}

impl SignalWindows {
    pub fn new(capacity: usize) -> Self {
        Self {
            hand_size: SmoothingWindow::new(capacity),
            pinch_distance: SmoothingWindow::new(capacity),
        }
    }

    fn window_mut(&mut self, signal: Signal) -> &mut SmoothingWindow {
        match signal {
            Signal::HandSize => &mut self.hand_size,
            Signal::PinchDistance => &mut self.pinch_distance,
        }
    }

    pub fn window(&self, signal: Signal) -> &SmoothingWindow {
        match signal {
            Signal::HandSize => &self.hand_size,
            Signal::PinchDistance => &self.pinch_distance,
        }
    }

    pub fn push(&mut self, signal: Signal, value: f64) {
        self.window_mut(signal).push(value);
    }

    pub fn read(&self, signal: Signal) -> f64 {
        self.window(signal).mean()
    }

    /// Pushes both measurements and returns the smoothed pair.
    pub fn push_sample(&mut self, sample: SignalSample) -> SignalSample {
        self.push(Signal::HandSize, sample.hand_size);
        self.push(Signal::PinchDistance, sample.pinch_distance);
        SignalSample {
            hand_size: self.read(Signal::HandSize),
            pinch_distance: self.read(Signal::PinchDistance),
        }
    }

    pub fn clear(&mut self) {
        self.hand_size.clear();
        self.pinch_distance.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_reads_zero() {
        let window = SmoothingWindow::new(5);
        assert_eq!(window.mean(), 0.0);
        assert!(window.is_empty());
    }

    #[test]
    fn mean_covers_last_k_pushes() {
        let values = [3.0, 9.0, 1.5, 7.0, 2.0, 11.0, 4.0, 8.0, 0.5];
        for capacity in 1..=6 {
            let mut window = SmoothingWindow::new(capacity);
            for (n, &v) in values.iter().enumerate() {
                window.push(v);
                let start = (n + 1).saturating_sub(capacity);
                let tail = &values[start..=n];
                let expected = tail.iter().sum::<f64>() / tail.len() as f64;
                assert!((window.mean() - expected).abs() < 1e-12);
                assert!(window.len() <= capacity);
            }
        }
    }

    #[test]
    fn oldest_sample_is_evicted_first() {
        let mut window = SmoothingWindow::new(2);
        window.push(100.0);
        window.push(2.0);
        window.push(4.0);
        assert_eq!(window.mean(), 3.0);
    }

    #[test]
    fn signal_windows_are_independent() {
        let mut windows = SignalWindows::new(5);
        windows.push(Signal::HandSize, 40.0);
        windows.push(Signal::PinchDistance, 6.0);
        windows.push(Signal::PinchDistance, 8.0);
        assert_eq!(windows.read(Signal::HandSize), 40.0);
        assert_eq!(windows.read(Signal::PinchDistance), 7.0);

        windows.clear();
        assert_eq!(windows.read(Signal::PinchDistance), 0.0);
    }

    #[test]
    fn zero_capacity_is_treated_as_one() {
        let mut window = SmoothingWindow::new(0);
        window.push(1.0);
        window.push(5.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.mean(), 5.0);
    }
}
