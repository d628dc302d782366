use std::collections::VecDeque;

/// An arithmetic mean over a fixed-size sliding window of samples.
///
/// The window is a FIFO: once at capacity, pushing a new sample evicts
/// the oldest. Used to smooth the selection-scoped download rate, where
/// a plain running average would react too slowly and a single sample
/// jitters too much.
#[derive(Debug, Clone)]
pub struct SlidingAvg {
    window: VecDeque<f64>,
    capacity: usize,
}

impl SlidingAvg {
    /// Creates an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes a sample, evicting the oldest one if the window is full.
    pub fn push(&mut self, sample: f64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    /// The mean of the samples currently in the window, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
