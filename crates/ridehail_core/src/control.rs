//! Commands a front end sends to the engine between blocks.

use serde::{Deserialize, Serialize};

use crate::scenario::{DispatchMethod, EquilibrationMethod, SimConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    #[default]
    Paused,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlCommand {
    Play,
    Pause,
    /// Runs exactly one block and leaves the engine paused.
    SingleStep,
    /// Back to block 0 with the current base configuration.
    Reset,
    UpdateParameters(ParameterUpdate),
}

/// New upper bound on trip distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripDistanceLimit {
    Limit(u32),
    /// Back to the city's largest wraparound distance.
    Unlimited,
}

impl TripDistanceLimit {
    fn bound(self) -> Option<u32> {
        match self {
            TripDistanceLimit::Limit(max) => Some(max),
            TripDistanceLimit::Unlimited => None,
        }
    }
}

/// A partial configuration change. Unset fields are left alone.
///
/// Everything except `city_size` applies to the running simulation without
/// touching the block index; a new city size rebuilds the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub vehicle_count: Option<usize>,
    pub request_rate: Option<f64>,
    pub price: Option<f64>,
    pub commission: Option<f64>,
    pub reservation_wage: Option<f64>,
    pub demand_elasticity: Option<f64>,
    pub inhomogeneity: Option<f64>,
    pub min_trip_distance: Option<u32>,
    pub max_trip_distance: Option<TripDistanceLimit>,
    pub idle_vehicles_moving: Option<bool>,
    pub dispatch: Option<DispatchMethod>,
    pub equilibration_method: Option<EquilibrationMethod>,
    /// Display pacing only; the engine stores it for front ends.
    pub frame_delay_ms: Option<u64>,
    pub city_size: Option<u32>,
}

impl ParameterUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_vehicle_count(mut self, vehicle_count: usize) -> Self {
        self.vehicle_count = Some(vehicle_count);
        self
    }

    pub fn with_request_rate(mut self, request_rate: f64) -> Self {
        self.request_rate = Some(request_rate);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_max_trip_distance(mut self, limit: TripDistanceLimit) -> Self {
        self.max_trip_distance = Some(limit);
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMethod) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn with_equilibration_method(mut self, method: EquilibrationMethod) -> Self {
        self.equilibration_method = Some(method);
        self
    }

    pub fn with_city_size(mut self, city_size: u32) -> Self {
        self.city_size = Some(city_size);
        self
    }

    /// Whether applying this update requires rebuilding the world.
    pub fn changes_city_size(&self, config: &SimConfig) -> bool {
        self.city_size.is_some_and(|size| size != config.city_size)
    }

    pub fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.vehicle_count {
            config.vehicle_count = v;
        }
        if let Some(v) = self.request_rate {
            config.request_rate = v;
        }
        if let Some(v) = self.price {
            config.economics.price = v;
        }
        if let Some(v) = self.commission {
            config.economics.commission = v;
        }
        if let Some(v) = self.reservation_wage {
            config.economics.reservation_wage = v;
        }
        if let Some(v) = self.demand_elasticity {
            config.economics.demand_elasticity = v;
        }
        if let Some(v) = self.inhomogeneity {
            config.inhomogeneity = v;
        }
        if let Some(v) = self.min_trip_distance {
            config.min_trip_distance = v;
        }
        if let Some(v) = self.max_trip_distance {
            config.max_trip_distance = v.bound();
        }
        if let Some(v) = self.idle_vehicles_moving {
            config.idle_vehicles_moving = v;
        }
        if let Some(v) = self.dispatch {
            config.dispatch = v;
        }
        if let Some(v) = self.equilibration_method {
            config.equilibration.method = v;
        }
        if let Some(v) = self.frame_delay_ms {
            config.frame_delay_ms = v;
        }
        if let Some(v) = self.city_size {
            config.city_size = v;
        }
    }
}
