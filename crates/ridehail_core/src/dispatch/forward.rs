use rand::RngCore;

use super::algorithm::DispatchAlgorithm;
use super::nearest::NearestDispatch;
use super::types::{Assignment, TripRequest, VehicleCandidate};
use crate::city::City;

/// Anticipatory matching: a vehicle still carrying a rider may take a trip if
/// it will finish and reach the origin sooner than any idle vehicle.
///
/// Busy candidates are those whose remaining ride is at most `horizon` blocks.
/// Their ETA is the remaining ride plus the distance from the drop-off point to
/// the origin. The lowest ETA wins; ties prefer an idle vehicle, then the lower
/// vehicle id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardDispatch {
    pub horizon: u32,
}

impl DispatchAlgorithm for ForwardDispatch {
    fn assign(
        &self,
        city: &City,
        vehicles: &[VehicleCandidate],
        trips: &[TripRequest],
        _rng: &mut dyn RngCore,
    ) -> Vec<Assignment> {
        let in_range: Vec<VehicleCandidate> = vehicles
            .iter()
            .filter(|v| v.busy_for <= self.horizon)
            .copied()
            .collect();
        NearestDispatch::greedy(city, &in_range, trips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::Location;
    use crate::entities::{TripId, VehicleId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn request() -> [TripRequest; 1] {
        [TripRequest {
            id: TripId(3),
            origin: Location::new(0, 0),
        }]
    }

    fn busy(id: u32, x: u32, busy_for: u32) -> VehicleCandidate {
        VehicleCandidate::finishing(VehicleId(id), Location::new(x, 0), busy_for)
    }

    #[test]
    fn a_soon_free_vehicle_beats_a_distant_idle_one() {
        let city = City::new(20).expect("city");
        let vehicles = [
            VehicleCandidate::idle(VehicleId(0), Location::new(8, 0)),
            busy(1, 1, 2),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let matched = ForwardDispatch { horizon: 20 }.assign(&city, &vehicles, &request(), &mut rng);
        assert_eq!(matched[0].vehicle, VehicleId(1));
    }

    #[test]
    fn equal_eta_prefers_the_idle_vehicle() {
        let city = City::new(20).expect("city");
        let vehicles = [busy(0, 1, 2), VehicleCandidate::idle(VehicleId(1), Location::new(3, 0))];
        let mut rng = StdRng::seed_from_u64(0);
        let matched = ForwardDispatch { horizon: 20 }.assign(&city, &vehicles, &request(), &mut rng);
        assert_eq!(matched[0].vehicle, VehicleId(1));
    }

    #[test]
    fn ride_ending_here_still_loses_a_tie_to_an_idle_vehicle() {
        let city = City::new(20).expect("city");
        // Both are two blocks from the origin; the busy one has already
        // reached its drop-off point.
        let vehicles = [busy(0, 2, 0), VehicleCandidate::idle(VehicleId(1), Location::new(2, 0))];
        let mut rng = StdRng::seed_from_u64(0);
        let matched = ForwardDispatch { horizon: 20 }.assign(&city, &vehicles, &request(), &mut rng);
        assert_eq!(matched[0].vehicle, VehicleId(1));
    }

    #[test]
    fn rides_beyond_the_horizon_are_ignored() {
        let city = City::new(20).expect("city");
        let vehicles = [busy(0, 0, 6), VehicleCandidate::idle(VehicleId(1), Location::new(9, 0))];
        let mut rng = StdRng::seed_from_u64(0);
        let matched = ForwardDispatch { horizon: 5 }.assign(&city, &vehicles, &request(), &mut rng);
        assert_eq!(matched[0].vehicle, VehicleId(1));
    }
}
