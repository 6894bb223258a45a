use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::adaptive::{CycleSignals, EquilibrationState, Regime, SETTLING_INTERVAL};
use crate::convergence::{ConvergenceConfig, ConvergenceTracker};
use crate::error::ConfigResult;
use crate::scenario::{EquilibrationConfig, EquilibrationMethod, EquilibrationMode};

/// Outcome of one equilibration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub block: u64,
    pub fleet: usize,
    /// Fleet size after the increment and the floor.
    pub target: usize,
    pub increment: i64,
    /// Mean utility error since the previous cycle.
    pub error: f64,
    pub residual: f64,
    /// `None` in fixed mode.
    pub regime: Option<Regime>,
    pub damping: f64,
    pub effective_damping: f64,
    pub next_cycle: u64,
}

/// Feedback loop that resizes the fleet toward zero utility error.
///
/// The engine feeds it one error sample per block through
/// [`EquilibrationController::observe`] and asks for a decision with
/// [`EquilibrationController::poll`]; a cycle fires once its block is reached.
#[derive(Debug, Clone, Resource)]
pub struct EquilibrationController {
    config: EquilibrationConfig,
    state: EquilibrationState,
    tracker: ConvergenceTracker,
    next_cycle: u64,
    error_sum: f64,
    error_samples: u32,
    cycles: u64,
}

impl EquilibrationController {
    pub fn new(config: EquilibrationConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            state: EquilibrationState::new(config.mode.damping()),
            tracker: ConvergenceTracker::new(ConvergenceConfig::default())?,
            next_cycle: first_cycle(&config.mode),
            error_sum: 0.0,
            error_samples: 0,
            cycles: 0,
            config,
        })
    }

    pub fn config(&self) -> &EquilibrationConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.method.is_enabled()
    }

    pub fn state(&self) -> &EquilibrationState {
        &self.state
    }

    pub fn tracker(&self) -> &ConvergenceTracker {
        &self.tracker
    }

    pub fn next_cycle(&self) -> u64 {
        self.next_cycle
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_due(&self, block: u64) -> bool {
        block >= self.next_cycle
    }

    pub fn observe(&mut self, error: f64) {
        self.tracker.push(error);
        self.error_sum += error;
        self.error_samples += 1;
    }

    /// Runs a cycle if one is due at `block`. A due cycle with no error
    /// samples since the previous one is skipped and rescheduled.
    pub fn poll(&mut self, block: u64, fleet: usize) -> Option<CycleReport> {
        if !self.is_due(block) {
            return None;
        }
        if self.error_samples == 0 {
            self.next_cycle = block + u64::from(self.current_interval());
            return None;
        }
        let error = self.error_sum / f64::from(self.error_samples);
        self.error_sum = 0.0;
        self.error_samples = 0;

        let v = fleet as f64;
        let (increment, residual, regime, damping, effective_damping, interval) =
            match self.config.mode {
                EquilibrationMode::Fixed { interval, damping } => {
                    let increment = (self.config.gain * damping * v * error).round() as i64;
                    (increment, error.abs(), None, damping, damping, interval)
                }
                EquilibrationMode::Adaptive { .. } => {
                    let residual = error.abs().max(self.tracker.max_rms_residual());
                    let decision = self.state.adapt(CycleSignals {
                        fleet,
                        error,
                        residual,
                        converged: self.tracker.is_converged(),
                        gain: self.config.gain,
                    });
                    (
                        decision.increment,
                        residual,
                        Some(decision.regime),
                        decision.damping,
                        decision.effective_damping,
                        decision.interval,
                    )
                }
            };

        let floor = self.config.min_vehicle_count as i64;
        let target = (fleet as i64 + increment).max(floor).max(0) as usize;
        self.next_cycle = block + u64::from(interval);
        self.cycles += 1;

        Some(CycleReport {
            block,
            fleet,
            target,
            increment,
            error,
            residual,
            regime,
            damping,
            effective_damping,
            next_cycle: self.next_cycle,
        })
    }

    fn current_interval(&self) -> u32 {
        match self.config.mode {
            EquilibrationMode::Fixed { interval, .. } => interval,
            EquilibrationMode::Adaptive { .. } => self.state.interval,
        }
    }

    /// Switches the tracked metric. Samples of the old metric are discarded.
    pub fn set_method(&mut self, method: EquilibrationMethod) {
        if method != self.config.method {
            self.config.method = method;
            self.tracker.reset();
            self.error_sum = 0.0;
            self.error_samples = 0;
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.tracker.reset();
        self.next_cycle = first_cycle(&self.config.mode);
        self.error_sum = 0.0;
        self.error_samples = 0;
        self.cycles = 0;
    }
}

fn first_cycle(mode: &EquilibrationMode) -> u64 {
    match *mode {
        EquilibrationMode::Fixed { interval, .. } => u64::from(interval),
        EquilibrationMode::Adaptive { .. } => u64::from(SETTLING_INTERVAL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equilibration::adaptive::CONVERGED_INTERVAL;

    fn adaptive() -> EquilibrationController {
        EquilibrationController::new(EquilibrationConfig {
            method: EquilibrationMethod::Price,
            ..EquilibrationConfig::default()
        })
        .expect("controller")
    }

    #[test]
    fn first_adaptive_cycle_waits_for_the_settling_interval() {
        let mut controller = adaptive();
        for block in 0..7 {
            controller.observe(-0.4);
            assert_eq!(controller.poll(block, 20), None);
        }
        controller.observe(-0.4);
        let report = controller.poll(7, 20).expect("cycle due");
        assert_eq!(report.regime, Some(Regime::Far));
        assert_eq!(report.increment, -2);
        assert_eq!(report.target, 18);
        assert_eq!(report.next_cycle, 10);
        assert_eq!(controller.cycles(), 1);
    }

    #[test]
    fn fixed_mode_applies_an_uncapped_proportional_step() {
        let mut controller = EquilibrationController::new(EquilibrationConfig {
            method: EquilibrationMethod::Price,
            mode: EquilibrationMode::Fixed {
                interval: 5,
                damping: 0.5,
            },
            ..EquilibrationConfig::default()
        })
        .expect("controller");
        for block in 0..5 {
            controller.observe(0.4);
            assert!(controller.poll(block, 50).is_none());
        }
        controller.observe(0.4);
        let report = controller.poll(5, 50).expect("cycle due");
        // 0.5 * 50 * 0.4 = 10, above the 10% cap adaptive mode would use.
        assert_eq!(report.increment, 10);
        assert_eq!(report.target, 60);
        assert_eq!(report.regime, None);
        assert_eq!(report.next_cycle, 10);
    }

    #[test]
    fn fleet_floor_is_respected() {
        let mut controller = EquilibrationController::new(EquilibrationConfig {
            method: EquilibrationMethod::Price,
            mode: EquilibrationMode::Fixed {
                interval: 1,
                damping: 1.0,
            },
            min_vehicle_count: 3,
            ..EquilibrationConfig::default()
        })
        .expect("controller");
        controller.observe(-1.0);
        let report = controller.poll(1, 4).expect("cycle due");
        assert_eq!(report.increment, -4);
        assert_eq!(report.target, 3);
    }

    #[test]
    fn cycle_without_samples_is_rescheduled() {
        let mut controller = adaptive();
        assert_eq!(controller.poll(7, 10), None);
        assert_eq!(controller.next_cycle(), 14);
        assert_eq!(controller.cycles(), 0);
    }

    #[test]
    fn reset_restores_the_initial_schedule() {
        let mut controller = adaptive();
        for block in 0..=7 {
            controller.observe(0.5);
            controller.poll(block, 10);
        }
        assert_eq!(controller.cycles(), 1);
        controller.reset();
        assert_eq!(controller.cycles(), 0);
        assert_eq!(controller.next_cycle(), 7);
        assert_eq!(controller.state(), &EquilibrationState::default());
        assert!(controller.tracker().samples().is_empty());
    }

    #[test]
    fn oscillating_error_is_never_treated_as_converged() {
        let mut controller = adaptive();
        let mut regimes = Vec::new();
        for block in 0..200u64 {
            controller.observe(if block % 2 == 0 { -0.1 } else { 0.1 });
            if let Some(report) = controller.poll(block, 20) {
                regimes.extend(report.regime);
                assert!(report.next_cycle - block < u64::from(CONVERGED_INTERVAL));
            }
        }
        assert!(!regimes.is_empty());
        assert!(regimes.iter().all(|r| *r != Regime::Converged), "{regimes:?}");
        assert!(!controller.tracker().is_converged());
    }

    #[test]
    fn huge_fixed_interval_builds_a_bounded_tracker() {
        let controller = EquilibrationController::new(EquilibrationConfig {
            method: EquilibrationMethod::Price,
            mode: EquilibrationMode::Fixed {
                interval: u32::MAX,
                damping: 1.0,
            },
            ..EquilibrationConfig::default()
        })
        .expect("controller");
        assert_eq!(controller.tracker().samples().capacity(), 20);
        assert_eq!(controller.next_cycle(), u64::from(u32::MAX));
    }
}
