//! Bounded reading windows.
//!
//! A [`ReadingWindow`] keeps the most recent `capacity` samples of one
//! channel. Pushing into a full window evicts the oldest sample first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Fixed-capacity FIFO of channel samples.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl ReadingWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning the evicted one if the window was full.
    pub fn push(&mut self, sample: f32) -> Option<f32> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Arithmetic mean of the stored samples, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|&s| f64::from(s)).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    /// Samples oldest first, as a vector.
    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }

    /// Number of samples currently stored.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the next push will evict.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Summary of the current contents.
    pub fn summary(&self) -> WindowSummary {
        WindowSummary {
            samples: self.len(),
            mean: self.mean(),
            latest: self.latest(),
        }
    }
}

/// Serializable summary of a window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub samples: usize,
    pub mean: Option<f64>,
    pub latest: Option<f32>,
}
