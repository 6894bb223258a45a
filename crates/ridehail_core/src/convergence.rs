//! Convergence detection for a tracked metric.
//!
//! The most recent samples are held in a [`CircularBuffer`] and dealt out
//! round-robin into `chains` interleaved sub-windows. Each time the window has
//! been refilled with fresh samples, a Gelman-Rubin style statistic compares the
//! spread of the chain means with the spread inside the chains. The metric is
//! reported converged only after that statistic has stayed under the threshold
//! for several evaluations in a row.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::buffer::CircularBuffer;
use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_CHAINS: usize = 4;
pub const DEFAULT_R_HAT_THRESHOLD: f64 = 0.02;
pub const DEFAULT_REQUIRED_STREAK: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    pub chains: usize,
    pub chain_length: usize,
    pub r_hat_threshold: f64,
    /// Consecutive passing evaluations needed before reporting convergence.
    pub required_streak: u32,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            chains: DEFAULT_CHAINS,
            chain_length: 5,
            r_hat_threshold: DEFAULT_R_HAT_THRESHOLD,
            required_streak: DEFAULT_REQUIRED_STREAK,
        }
    }
}

impl ConvergenceConfig {
    pub fn window(&self) -> ConfigResult<NonZeroUsize> {
        NonZeroUsize::new(self.chains * self.chain_length).ok_or(ConfigError::ZeroCapacity {
            what: "convergence window",
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.chains < 2 || self.chain_length < 2 {
            return Err(ConfigError::ZeroCapacity {
                what: "convergence chain",
            });
        }
        if !self.r_hat_threshold.is_finite() || self.r_hat_threshold < 0.0 {
            return Err(ConfigError::Negative {
                name: "r_hat_threshold",
                value: self.r_hat_threshold,
            });
        }
        self.window().map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChainStats {
    count: usize,
    mean: f64,
    /// Sample variance (n - 1 denominator).
    variance: f64,
    /// Root mean square deviation from the whole-window mean.
    rms_residual: f64,
}

#[derive(Debug, Clone)]
pub struct ConvergenceTracker {
    config: ConvergenceConfig,
    window: CircularBuffer,
    since_evaluation: usize,
    streak: u32,
    last_r_hat: Option<f64>,
}

impl ConvergenceTracker {
    pub fn new(config: ConvergenceConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            window: CircularBuffer::new(config.window()?),
            since_evaluation: 0,
            streak: 0,
            last_r_hat: None,
        })
    }

    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// Adds a sample; returns the statistic when this sample completed a window refill.
    pub fn push(&mut self, value: f64) -> Option<Option<f64>> {
        self.window.push(value);
        self.since_evaluation += 1;
        if !self.window.is_full() || self.since_evaluation < self.window.capacity() {
            return None;
        }
        self.since_evaluation = 0;
        let r_hat = self.r_hat();
        match r_hat {
            Some(r) if r < self.config.r_hat_threshold => self.streak += 1,
            _ => self.streak = 0,
        }
        self.last_r_hat = r_hat;
        Some(r_hat)
    }

    pub fn is_converged(&self) -> bool {
        self.streak >= self.config.required_streak
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn last_r_hat(&self) -> Option<f64> {
        self.last_r_hat
    }

    pub fn samples(&self) -> &CircularBuffer {
        &self.window
    }

    fn chain_stats(&self) -> Vec<ChainStats> {
        let chains = self.config.chains;
        let Some(grand_mean) = self.window.mean() else {
            return Vec::new();
        };
        // Absolute index of the oldest held sample, so chain membership does not
        // shift as the window rolls.
        let first = self.window.total_pushed() - self.window.len() as u64;
        let mut members: Vec<Vec<f64>> = vec![Vec::new(); chains];
        for (offset, value) in self.window.iter().enumerate() {
            let chain = ((first + offset as u64) % chains as u64) as usize;
            members[chain].push(value);
        }

        members
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| {
                let n = m.len() as f64;
                let mean = m.iter().sum::<f64>() / n;
                let variance = if m.len() > 1 {
                    m.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
                } else {
                    0.0
                };
                let rms_residual =
                    (m.iter().map(|x| (x - grand_mean).powi(2)).sum::<f64>() / n).sqrt();
                ChainStats {
                    count: m.len(),
                    mean,
                    variance,
                    rms_residual,
                }
            })
            .collect()
    }

    /// Ratio of between-chain variance (of the chain means) to mean within-chain
    /// variance, over the current window.
    ///
    /// `None` when fewer than two chains hold at least two samples. The
    /// between-chain term always covers every populated chain. A chain with zero
    /// variance is settled on its own level and is left out of the within-chain
    /// term only. When every chain is flat the result is `0.0` if the chain means
    /// agree and infinite otherwise, so a metric alternating between levels is
    /// never reported converged.
    pub fn r_hat(&self) -> Option<f64> {
        let stats = self.chain_stats();
        let populated: Vec<&ChainStats> = stats.iter().filter(|s| s.count >= 2).collect();
        if populated.len() < 2 {
            return None;
        }
        let m = populated.len() as f64;
        let mean_of_means = populated.iter().map(|s| s.mean).sum::<f64>() / m;
        let between = populated
            .iter()
            .map(|s| (s.mean - mean_of_means).powi(2))
            .sum::<f64>()
            / (m - 1.0);

        let varying: Vec<f64> = populated
            .iter()
            .map(|s| s.variance)
            .filter(|v| *v > f64::EPSILON)
            .collect();
        if varying.is_empty() {
            return Some(if between > f64::EPSILON { f64::INFINITY } else { 0.0 });
        }
        let within = varying.iter().sum::<f64>() / varying.len() as f64;
        Some(between / within)
    }

    /// Worst chain's RMS deviation from the running mean of the whole window.
    pub fn max_rms_residual(&self) -> f64 {
        self.chain_stats()
            .iter()
            .map(|s| s.rms_residual)
            .fold(0.0, f64::max)
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.since_evaluation = 0;
        self.streak = 0;
        self.last_r_hat = None;
    }
}
