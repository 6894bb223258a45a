//! Fleet-size equilibration.
//!
//! Each block the engine turns the rolling window statistics into a utility
//! error for the configured method and feeds it to the
//! [`EquilibrationController`]. When a cycle is due the controller proposes a
//! new fleet size; fixed mode applies a plain proportional step, adaptive mode
//! tunes its interval and damping from the [`crate::convergence`] signals.

mod adaptive;
mod controller;

pub use adaptive::{
    step_cap, AdaptiveDecision, CycleSignals, EquilibrationState, Regime, CONVERGED_INTERVAL,
    FAR_INTERVAL, FAR_RESIDUAL, MAX_ADAPTIVE_INTERVAL, MAX_DAMPING, MIN_ADAPTIVE_INTERVAL,
    MIN_DAMPING, SETTLING_INTERVAL,
};
pub use controller::{CycleReport, EquilibrationController};

use crate::scenario::EquilibrationMethod;
use crate::telemetry::WindowStats;

/// Signed distance from equilibrium; positive means the fleet should grow.
///
/// `None` when the method is disabled or has nothing to measure yet (wait
/// fraction before any trip has completed in the window).
pub fn utility_error(method: EquilibrationMethod, stats: &WindowStats) -> Option<f64> {
    match method {
        EquilibrationMethod::None => None,
        EquilibrationMethod::Price => Some(stats.vehicle_utility),
        EquilibrationMethod::WaitFraction { target } => stats.wait_fraction.map(|w| w - target),
    }
}
