//! Per-block matching of vehicles to unassigned trips.
//!
//! The configured rule is held as a [`DispatchPolicy`] resource and invoked
//! through [`DispatchAlgorithm`]; the dispatch system gathers candidates and
//! applies the returned assignments through the registry transitions.

pub mod algorithm;
pub mod forward;
pub mod legacy;
pub mod nearest;
pub mod random;
pub mod types;

use std::collections::HashSet;

use bevy_ecs::prelude::Resource;
use rand::RngCore;

pub use algorithm::DispatchAlgorithm;
pub use forward::ForwardDispatch;
pub use legacy::LegacyDispatch;
pub use nearest::NearestDispatch;
pub use random::RandomDispatch;
pub use types::{Assignment, TripRequest, VehicleCandidate};

use crate::city::City;
use crate::error::InvariantViolation;
use crate::scenario::{DispatchMethod, SimConfig};

/// The active dispatch rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource)]
pub enum DispatchPolicy {
    Nearest(NearestDispatch),
    Random(RandomDispatch),
    Legacy(LegacyDispatch),
    Forward(ForwardDispatch),
}

impl DispatchPolicy {
    pub fn from_config(config: &SimConfig) -> Self {
        match config.dispatch {
            DispatchMethod::Default => DispatchPolicy::Nearest(NearestDispatch),
            DispatchMethod::Random => DispatchPolicy::Random(RandomDispatch),
            DispatchMethod::Legacy => DispatchPolicy::Legacy(LegacyDispatch),
            DispatchMethod::Forward => DispatchPolicy::Forward(ForwardDispatch {
                horizon: config.forward_horizon(),
            }),
        }
    }

    pub fn method(&self) -> DispatchMethod {
        match self {
            DispatchPolicy::Nearest(_) => DispatchMethod::Default,
            DispatchPolicy::Random(_) => DispatchMethod::Random,
            DispatchPolicy::Legacy(_) => DispatchMethod::Legacy,
            DispatchPolicy::Forward(_) => DispatchMethod::Forward,
        }
    }

    /// Whether vehicles still carrying a rider are offered as candidates.
    pub fn considers_busy_vehicles(&self) -> bool {
        matches!(self, DispatchPolicy::Forward(_))
    }

    fn algorithm(&self) -> &dyn DispatchAlgorithm {
        match self {
            DispatchPolicy::Nearest(a) => a,
            DispatchPolicy::Random(a) => a,
            DispatchPolicy::Legacy(a) => a,
            DispatchPolicy::Forward(a) => a,
        }
    }

    pub fn assign(
        &self,
        city: &City,
        vehicles: &[VehicleCandidate],
        trips: &[TripRequest],
        rng: &mut dyn RngCore,
    ) -> Vec<Assignment> {
        if vehicles.is_empty() || trips.is_empty() {
            return Vec::new();
        }
        self.algorithm().assign(city, vehicles, trips, rng)
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        DispatchPolicy::Nearest(NearestDispatch)
    }
}

/// Rejects a matching that uses any vehicle or trip twice.
pub fn check_assignments(assignments: &[Assignment]) -> Result<(), InvariantViolation> {
    let mut vehicles = HashSet::with_capacity(assignments.len());
    let mut trips = HashSet::with_capacity(assignments.len());
    for assignment in assignments {
        if !vehicles.insert(assignment.vehicle) {
            return Err(InvariantViolation::VehicleMatchedTwice(assignment.vehicle));
        }
        if !trips.insert(assignment.trip) {
            return Err(InvariantViolation::TripMatchedTwice(assignment.trip));
        }
    }
    Ok(())
}
