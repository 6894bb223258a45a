//! Self-tuning of the equilibration step: oscillation and improvement
//! detection adjust a stored damping factor, and a regime-dependent gain
//! schedule scales it for the current cycle.

use serde::{Deserialize, Serialize};

/// Residual above which the metric counts as far from equilibrium.
pub const FAR_RESIDUAL: f64 = 0.15;

pub const FAR_INTERVAL: u32 = 3;
pub const SETTLING_INTERVAL: u32 = 7;
pub const CONVERGED_INTERVAL: u32 = 20;
pub const MIN_ADAPTIVE_INTERVAL: u32 = FAR_INTERVAL;
pub const MAX_ADAPTIVE_INTERVAL: u32 = CONVERGED_INTERVAL;

pub const MIN_DAMPING: f64 = 0.05;
pub const MAX_DAMPING: f64 = 2.0;

/// Consecutive sign reversals before the damping factor is raised.
const OSCILLATION_LIMIT: u32 = 3;
const OSCILLATION_BOOST: f64 = 1.5;
/// Consecutive improving cycles before the damping factor is lowered.
const IMPROVEMENT_LIMIT: u32 = 2;
const IMPROVEMENT_CUT: f64 = 0.7;
/// A residual counts as improved when it drops below this share of the last one.
const IMPROVEMENT_RATIO: f64 = 0.95;

const FAR_GAIN: f64 = 1.5;
const CONVERGED_GAIN: f64 = 0.2;

/// Largest per-cycle change as a share of the current fleet.
const STEP_CAP_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    /// Residual above [`FAR_RESIDUAL`]. Takes precedence over `Converged`.
    Far,
    Settling,
    Converged,
}

impl Regime {
    pub fn classify(residual: f64, converged: bool) -> Self {
        if residual > FAR_RESIDUAL {
            Regime::Far
        } else if converged {
            Regime::Converged
        } else {
            Regime::Settling
        }
    }

    /// Blocks until the next cycle.
    pub fn interval(self) -> u32 {
        match self {
            Regime::Far => FAR_INTERVAL,
            Regime::Settling => SETTLING_INTERVAL,
            Regime::Converged => CONVERGED_INTERVAL,
        }
    }

    pub fn gain(self) -> f64 {
        match self {
            Regime::Far => FAR_GAIN,
            Regime::Settling => 1.0,
            Regime::Converged => CONVERGED_GAIN,
        }
    }
}

/// Largest fleet change allowed in one cycle: 10% of the fleet, at least one vehicle.
pub fn step_cap(fleet: usize) -> i64 {
    ((fleet as f64 * STEP_CAP_FRACTION).round() as i64).max(1)
}

/// Signals gathered for one adaptive cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSignals {
    pub fleet: usize,
    /// Mean utility error since the previous cycle; positive grows the fleet.
    pub error: f64,
    pub residual: f64,
    pub converged: bool,
    /// Proportional gain `K_p`.
    pub gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveDecision {
    /// Signed fleet change, already capped.
    pub increment: i64,
    pub regime: Regime,
    /// Stored damping after oscillation and improvement adjustments.
    pub damping: f64,
    /// Damping used for this cycle after gain scheduling.
    pub effective_damping: f64,
    pub interval: u32,
}

/// Controller memory carried between adaptive cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibrationState {
    pub damping: f64,
    pub interval: u32,
    pub oscillations: u32,
    pub improvements: u32,
    /// Sign of the last nonzero increment; 0 before the first one.
    pub last_sign: i64,
    pub last_residual: Option<f64>,
    seed_damping: f64,
}

impl EquilibrationState {
    pub fn new(seed_damping: f64) -> Self {
        Self {
            damping: seed_damping.clamp(MIN_DAMPING, MAX_DAMPING),
            interval: SETTLING_INTERVAL,
            oscillations: 0,
            improvements: 0,
            last_sign: 0,
            last_residual: None,
            seed_damping,
        }
    }

    pub fn seed_damping(&self) -> f64 {
        self.seed_damping
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.seed_damping);
    }

    /// Runs one adaptive cycle and returns the capped fleet change.
    pub fn adapt(&mut self, signals: CycleSignals) -> AdaptiveDecision {
        let fleet = signals.fleet as f64;
        let cap = step_cap(signals.fleet) as f64;
        let capped = (signals.gain * fleet * signals.error).clamp(-cap, cap);

        let sign = (capped.round() as i64).signum();
        if sign != 0 {
            if self.last_sign != 0 && sign != self.last_sign {
                self.oscillations += 1;
                if self.oscillations >= OSCILLATION_LIMIT {
                    self.damping *= OSCILLATION_BOOST;
                    self.oscillations = 0;
                }
            } else {
                self.oscillations = 0;
            }
            self.last_sign = sign;
        }

        match self.last_residual {
            Some(previous) if signals.residual < previous * IMPROVEMENT_RATIO => {
                self.improvements += 1;
                if self.improvements >= IMPROVEMENT_LIMIT {
                    self.damping *= IMPROVEMENT_CUT;
                    self.improvements = 0;
                }
            }
            _ => self.improvements = 0,
        }
        self.last_residual = Some(signals.residual);
        self.damping = self.damping.clamp(MIN_DAMPING, MAX_DAMPING);

        let regime = Regime::classify(signals.residual, signals.converged);
        let effective_damping = (self.damping * regime.gain()).clamp(MIN_DAMPING, MAX_DAMPING);
        let increment = ((capped * effective_damping).round() as i64).clamp(-(cap as i64), cap as i64);
        self.interval = regime
            .interval()
            .clamp(MIN_ADAPTIVE_INTERVAL, MAX_ADAPTIVE_INTERVAL);

        AdaptiveDecision {
            increment,
            regime,
            damping: self.damping,
            effective_damping,
            interval: self.interval,
        }
    }
}

impl Default for EquilibrationState {
    fn default() -> Self {
        Self::new(crate::scenario::DEFAULT_ADAPTIVE_SEED_DAMPING)
    }
}
