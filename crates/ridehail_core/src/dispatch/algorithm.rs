use rand::RngCore;

use super::types::{Assignment, TripRequest, VehicleCandidate};
use crate::city::City;

/// Matching rule for one dispatch pass.
///
/// Implementations receive the candidates in vehicle-id order and the requests
/// in trip-id order, and return a one-to-one matching: no vehicle and no trip
/// may appear twice. Trips left out stay unassigned, vehicles left out stay
/// as they are.
pub trait DispatchAlgorithm {
    fn assign(
        &self,
        city: &City,
        vehicles: &[VehicleCandidate],
        trips: &[TripRequest],
        rng: &mut dyn RngCore,
    ) -> Vec<Assignment>;
}
