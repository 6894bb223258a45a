use rand::RngCore;

use super::algorithm::DispatchAlgorithm;
use super::types::{Assignment, TripRequest, VehicleCandidate};
use crate::city::City;

/// Nearest-vehicle matching.
///
/// Trips are served oldest first. Each takes the remaining candidate with the
/// lowest ETA (blocks until free plus wraparound distance to the origin);
/// ties go to an idle vehicle, then to the lower vehicle id. With only idle
/// candidates this is plain nearest-by-distance.
///
/// Time complexity: O(t * v) for t trips and v candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestDispatch;

impl NearestDispatch {
    pub(super) fn eta(city: &City, vehicle: &VehicleCandidate, trip: &TripRequest) -> u32 {
        vehicle.busy_for + city.distance(vehicle.location, trip.origin)
    }

    pub(super) fn greedy(
        city: &City,
        vehicles: &[VehicleCandidate],
        trips: &[TripRequest],
    ) -> Vec<Assignment> {
        let mut available: Vec<VehicleCandidate> = vehicles.to_vec();
        let mut assignments = Vec::with_capacity(trips.len().min(vehicles.len()));
        for trip in trips {
            let best = available
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| (Self::eta(city, v, trip), !v.is_idle(), v.id))
                .map(|(idx, _)| idx);
            let Some(idx) = best else {
                break;
            };
            let vehicle = available.remove(idx);
            assignments.push(Assignment {
                vehicle: vehicle.id,
                trip: trip.id,
            });
        }
        assignments
    }
}

impl DispatchAlgorithm for NearestDispatch {
    fn assign(
        &self,
        city: &City,
        vehicles: &[VehicleCandidate],
        trips: &[TripRequest],
        _rng: &mut dyn RngCore,
    ) -> Vec<Assignment> {
        Self::greedy(city, vehicles, trips)
    }
}
