use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::city::City;
use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_CITY_SIZE: u32 = 8;
pub const DEFAULT_VEHICLE_COUNT: usize = 8;
pub const DEFAULT_REQUEST_RATE: f64 = 0.5;
pub const DEFAULT_RESULTS_WINDOW: usize = 50;
pub const MAX_RESULTS_WINDOW: usize = 100_000;
/// Blocks between trip-registry purges. Keeps peak dead-trip count at
/// `interval x ceil(request rate)`.
pub const DEFAULT_GC_INTERVAL: u64 = 10;

/// How idle vehicles are matched to unassigned trips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMethod {
    /// Nearest idle vehicle; ties go to the lower vehicle id.
    #[default]
    Default,
    /// Uniformly random idle vehicle.
    Random,
    /// Nearest vehicle found by scanning idle vehicles in shuffled order.
    Legacy,
    /// Nearest by ETA, including vehicles about to finish a ride.
    Forward,
}

/// Metric the equilibration loop drives toward zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum EquilibrationMethod {
    #[default]
    None,
    /// Net income of a vehicle-block against the reservation wage.
    Price,
    /// Share of a trip spent waiting, against a target share.
    WaitFraction { target: f64 },
}

impl EquilibrationMethod {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, EquilibrationMethod::None)
    }
}

pub const DEFAULT_ADAPTIVE_SEED_DAMPING: f64 = 1.0;

/// Cycle timing of the equilibration loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EquilibrationMode {
    /// Every `interval` blocks, with a constant damping factor.
    Fixed { interval: u32, damping: f64 },
    /// Interval and damping tuned each cycle, starting from `seed_damping`.
    Adaptive { seed_damping: f64 },
}

impl Default for EquilibrationMode {
    fn default() -> Self {
        EquilibrationMode::Adaptive {
            seed_damping: DEFAULT_ADAPTIVE_SEED_DAMPING,
        }
    }
}

impl EquilibrationMode {
    /// Decodes the historical single-integer form, where interval 0 selected
    /// adaptive mode.
    pub fn from_interval(interval: u32, damping: f64) -> Self {
        if interval == 0 {
            EquilibrationMode::Adaptive {
                seed_damping: damping,
            }
        } else {
            EquilibrationMode::Fixed { interval, damping }
        }
    }

    pub fn damping(&self) -> f64 {
        match *self {
            EquilibrationMode::Fixed { damping, .. } => damping,
            EquilibrationMode::Adaptive { seed_damping } => seed_damping,
        }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, EquilibrationMode::Adaptive { .. })
    }

    fn validate(&self) -> ConfigResult<()> {
        if let EquilibrationMode::Fixed { interval: 0, .. } = self {
            return Err(ConfigError::ZeroInterval {
                what: "equilibration",
            });
        }
        let damping = self.damping();
        if !damping.is_finite() || damping <= 0.0 {
            return Err(ConfigError::InvalidDamping(damping));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibrationConfig {
    pub method: EquilibrationMethod,
    pub mode: EquilibrationMode,
    /// Proportional gain `K_p`.
    pub gain: f64,
    /// The fleet is never shrunk below this.
    pub min_vehicle_count: usize,
}

impl Default for EquilibrationConfig {
    fn default() -> Self {
        Self {
            method: EquilibrationMethod::None,
            mode: EquilibrationMode::default(),
            gain: 1.0,
            min_vehicle_count: 1,
        }
    }
}

impl EquilibrationConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.mode.validate()?;
        if !self.gain.is_finite() || self.gain <= 0.0 {
            return Err(ConfigError::Negative {
                name: "equilibration gain",
                value: self.gain,
            });
        }
        if let EquilibrationMethod::WaitFraction { target } = self.method {
            check_probability("wait fraction target", target)?;
        }
        Ok(())
    }
}

/// Fare and cost parameters behind the Price equilibration method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Economics {
    /// Fare per block of riding.
    pub price: f64,
    /// Platform share of the fare.
    pub commission: f64,
    /// Per-block income below which drivers leave.
    pub reservation_wage: f64,
    /// Demand scales as `price^-elasticity`.
    pub demand_elasticity: f64,
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            price: 1.0,
            commission: 0.25,
            reservation_wage: 0.35,
            demand_elasticity: 0.0,
        }
    }
}

impl Economics {
    /// Driver income per block spent with a rider.
    pub fn driver_fare(&self) -> f64 {
        self.price * (1.0 - self.commission)
    }

    /// Request rate after the price response of demand.
    pub fn effective_rate(&self, base_rate: f64) -> f64 {
        if self.demand_elasticity == 0.0 {
            base_rate
        } else {
            base_rate * self.price.powf(-self.demand_elasticity)
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        check_non_negative("price", self.price)?;
        check_probability("commission", self.commission)?;
        check_non_negative("reservation wage", self.reservation_wage)?;
        check_non_negative("demand elasticity", self.demand_elasticity)?;
        if self.demand_elasticity > 0.0 && self.price == 0.0 {
            return Err(ConfigError::Negative {
                name: "price (with elastic demand)",
                value: self.price,
            });
        }
        Ok(())
    }
}

/// Riders give up after a wait drawn uniformly from `[min_wait, max_wait]` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationConfig {
    pub min_wait: u32,
    pub max_wait: u32,
}

/// Full configuration of a simulation run. Consumed at construction and reset;
/// the live-tunable subset can also be changed between blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct SimConfig {
    pub city_size: u32,
    pub vehicle_count: usize,
    /// Mean trip requests per block.
    pub request_rate: f64,
    pub min_trip_distance: u32,
    /// `None` allows any distance the city offers.
    pub max_trip_distance: Option<u32>,
    /// Probability that a request originates in the city centre.
    pub inhomogeneity: f64,
    pub idle_vehicles_moving: bool,
    pub cancellation: Option<CancellationConfig>,
    pub dispatch: DispatchMethod,
    /// How far ahead forward dispatch looks for vehicles finishing a ride.
    /// `None` uses the city size.
    pub forward_dispatch_horizon: Option<u32>,
    pub equilibration: EquilibrationConfig,
    pub economics: Economics,
    /// Capacity of the rolling history buffers.
    pub results_window: usize,
    pub gc_interval: u64,
    /// Pause between frames for front ends; not used by the engine itself.
    pub frame_delay_ms: u64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            city_size: DEFAULT_CITY_SIZE,
            vehicle_count: DEFAULT_VEHICLE_COUNT,
            request_rate: DEFAULT_REQUEST_RATE,
            min_trip_distance: 0,
            max_trip_distance: None,
            inhomogeneity: 0.0,
            idle_vehicles_moving: true,
            cancellation: None,
            dispatch: DispatchMethod::Default,
            forward_dispatch_horizon: None,
            equilibration: EquilibrationConfig::default(),
            economics: Economics::default(),
            results_window: DEFAULT_RESULTS_WINDOW,
            gc_interval: DEFAULT_GC_INTERVAL,
            frame_delay_ms: 0,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn with_city_size(mut self, city_size: u32) -> Self {
        self.city_size = city_size;
        self
    }

    pub fn with_vehicle_count(mut self, vehicle_count: usize) -> Self {
        self.vehicle_count = vehicle_count;
        self
    }

    pub fn with_request_rate(mut self, request_rate: f64) -> Self {
        self.request_rate = request_rate;
        self
    }

    pub fn with_trip_distance(mut self, min: u32, max: Option<u32>) -> Self {
        self.min_trip_distance = min;
        self.max_trip_distance = max;
        self
    }

    pub fn with_inhomogeneity(mut self, inhomogeneity: f64) -> Self {
        self.inhomogeneity = inhomogeneity;
        self
    }

    pub fn with_idle_vehicles_moving(mut self, moving: bool) -> Self {
        self.idle_vehicles_moving = moving;
        self
    }

    pub fn with_cancellation(mut self, min_wait: u32, max_wait: u32) -> Self {
        self.cancellation = Some(CancellationConfig { min_wait, max_wait });
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMethod) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_forward_dispatch_horizon(mut self, horizon: u32) -> Self {
        self.forward_dispatch_horizon = Some(horizon);
        self
    }

    pub fn with_equilibration(mut self, method: EquilibrationMethod, mode: EquilibrationMode) -> Self {
        self.equilibration.method = method;
        self.equilibration.mode = mode;
        self
    }

    pub fn with_equilibration_gain(mut self, gain: f64) -> Self {
        self.equilibration.gain = gain;
        self
    }

    pub fn with_min_vehicle_count(mut self, floor: usize) -> Self {
        self.equilibration.min_vehicle_count = floor;
        self
    }

    pub fn with_economics(mut self, economics: Economics) -> Self {
        self.economics = economics;
        self
    }

    pub fn with_results_window(mut self, window: usize) -> Self {
        self.results_window = window;
        self
    }

    pub fn with_gc_interval(mut self, interval: u64) -> Self {
        self.gc_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Upper trip-distance bound actually reachable in this city.
    pub fn effective_max_trip_distance(&self) -> u32 {
        let reachable = 2 * (self.city_size / 2);
        self.max_trip_distance
            .unwrap_or(self.city_size)
            .min(reachable)
    }

    pub fn forward_horizon(&self) -> u32 {
        self.forward_dispatch_horizon.unwrap_or(self.city_size)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let city = City::new(self.city_size)?;
        check_non_negative("request rate", self.request_rate)?;
        check_probability("inhomogeneity", self.inhomogeneity)?;

        if let Some(max) = self.max_trip_distance {
            if self.min_trip_distance > max {
                return Err(ConfigError::TripDistanceBounds {
                    min: self.min_trip_distance,
                    max,
                });
            }
        }
        if self.min_trip_distance > city.max_distance() {
            return Err(ConfigError::UnreachableTripDistance {
                min: self.min_trip_distance,
                city_size: self.city_size,
            });
        }

        if let Some(window) = self.cancellation {
            if window.min_wait > window.max_wait {
                return Err(ConfigError::CancellationWindow {
                    min: window.min_wait,
                    max: window.max_wait,
                });
            }
        }
        if self.results_window == 0 {
            return Err(ConfigError::ZeroCapacity {
                what: "results window",
            });
        }
        if self.results_window > MAX_RESULTS_WINDOW {
            return Err(ConfigError::TooLarge {
                what: "results window",
                value: self.results_window,
                max: MAX_RESULTS_WINDOW,
            });
        }
        if self.gc_interval == 0 {
            return Err(ConfigError::ZeroInterval {
                what: "garbage collection",
            });
        }
        self.economics.validate()?;
        self.equilibration.validate()
    }
}

fn check_non_negative(name: &'static str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(())
}

fn check_probability(name: &'static str, value: f64) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::NotAProbability { name, value });
    }
    Ok(())
}
