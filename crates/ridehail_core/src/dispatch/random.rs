use rand::{Rng, RngCore};

use super::algorithm::DispatchAlgorithm;
use super::types::{Assignment, TripRequest, VehicleCandidate};
use crate::city::City;

/// Each trip, oldest first, takes a uniformly random remaining vehicle.
/// Distance plays no part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomDispatch;

impl DispatchAlgorithm for RandomDispatch {
    fn assign(
        &self,
        _city: &City,
        vehicles: &[VehicleCandidate],
        trips: &[TripRequest],
        rng: &mut dyn RngCore,
    ) -> Vec<Assignment> {
        let mut available: Vec<VehicleCandidate> = vehicles.to_vec();
        let mut assignments = Vec::with_capacity(trips.len().min(vehicles.len()));
        for trip in trips {
            if available.is_empty() {
                break;
            }
            let vehicle = available.remove(rng.gen_range(0..available.len()));
            assignments.push(Assignment {
                vehicle: vehicle.id,
                trip: trip.id,
            });
        }
        assignments
    }
}
