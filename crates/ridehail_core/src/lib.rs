pub mod buffer;
pub mod city;
pub mod clock;
pub mod control;
pub mod convergence;
pub mod dispatch;
pub mod engine;
pub mod entities;
pub mod equilibration;
pub mod error;
pub mod registry;
pub mod rng;
pub mod runner;
pub mod scenario;
pub mod spawner;
pub mod systems;
pub mod telemetry;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use control::{ControlCommand, ParameterUpdate, RunMode, TripDistanceLimit};
pub use engine::TimeStepEngine;
pub use error::{ConfigError, ConfigResult, InvariantViolation};
pub use scenario::SimConfig;
