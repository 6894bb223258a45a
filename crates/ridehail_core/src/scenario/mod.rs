//! Scenario setup: run configuration and the world it builds.

mod build;
mod params;

pub use build::build_world;
pub use params::{
    CancellationConfig, DispatchMethod, Economics, EquilibrationConfig, EquilibrationMethod,
    EquilibrationMode, SimConfig, DEFAULT_ADAPTIVE_SEED_DAMPING, DEFAULT_CITY_SIZE,
    DEFAULT_GC_INTERVAL, DEFAULT_REQUEST_RATE, DEFAULT_RESULTS_WINDOW, DEFAULT_VEHICLE_COUNT,
};
