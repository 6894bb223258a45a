use rand::seq::SliceRandom;
use rand::RngCore;

use super::algorithm::DispatchAlgorithm;
use super::types::{Assignment, TripRequest, VehicleCandidate};
use crate::city::City;

/// Historical matching rule, kept so old result sets can be reproduced.
///
/// Idle vehicles are shuffled once per pass. Each trip, oldest first, takes the
/// first vehicle in shuffled order at the minimum distance, so distance ties
/// are broken by the shuffle instead of by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyDispatch;

impl DispatchAlgorithm for LegacyDispatch {
    fn assign(
        &self,
        city: &City,
        vehicles: &[VehicleCandidate],
        trips: &[TripRequest],
        rng: &mut dyn RngCore,
    ) -> Vec<Assignment> {
        let mut available: Vec<VehicleCandidate> = vehicles.to_vec();
        available.shuffle(rng);
        let mut assignments = Vec::with_capacity(trips.len().min(vehicles.len()));
        for trip in trips {
            let mut best: Option<(usize, u32)> = None;
            for (idx, vehicle) in available.iter().enumerate() {
                let distance = city.distance(vehicle.location, trip.origin);
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((idx, distance));
                }
            }
            let Some((idx, _)) = best else {
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
