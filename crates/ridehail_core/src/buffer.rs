//! Fixed-capacity rolling sample window.

use std::num::NonZeroUsize;

use crate::error::{ConfigError, ConfigResult};

/// Ring buffer of `f64` samples. Once full, each push overwrites the oldest sample.
///
/// Capacity is a [`NonZeroUsize`], so a zero-length window (and the modulo by
/// zero that comes with it) cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularBuffer {
    samples: Vec<f64>,
    capacity: NonZeroUsize,
    /// Slot the next push writes to.
    write_idx: usize,
    /// Total pushes since construction or the last clear.
    pushed: u64,
    /// Running sum of the held samples, recomputed each time the write slot wraps.
    sum: f64,
}

impl CircularBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: Vec::new(),
            capacity,
            write_idx: 0,
            pushed: 0,
            sum: 0.0,
        }
    }

    pub fn try_new(capacity: usize, what: &'static str) -> ConfigResult<Self> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(ConfigError::ZeroCapacity { what })
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity.get()
    }

    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    pub fn push(&mut self, value: f64) {
        if self.is_full() {
            self.sum -= self.samples[self.write_idx];
            self.samples[self.write_idx] = value;
        } else {
            self.samples.push(value);
        }
        self.sum += value;
        self.write_idx = (self.write_idx + 1) % self.capacity.get();
        self.pushed += 1;
        if self.write_idx == 0 {
            self.sum = self.samples.iter().sum();
        }
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = (self.write_idx + self.capacity.get() - 1) % self.capacity.get();
        self.samples.get(idx).copied()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (older, newer) = if self.is_full() {
            self.samples.split_at(self.write_idx)
        } else {
            self.samples.split_at(0)
        };
        newer.iter().chain(older.iter()).copied()
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.iter().collect()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum() / self.samples.len() as f64)
        }
    }

    /// Population variance of the held samples.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let sq: f64 = self.samples.iter().map(|x| (x - mean).powi(2)).sum();
        Some(sq / self.samples.len() as f64)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.write_idx = 0;
        self.pushed = 0;
        self.sum = 0.0;
    }
}
