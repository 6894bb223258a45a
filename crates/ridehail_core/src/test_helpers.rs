//! Shared setup for unit tests, integration tests and benchmarks.

use crate::city::{Direction, Location};
use crate::entities::{TripId, VehicleId};
use crate::registry::{self, TripDraft, TripRegistry, VehicleRegistry};
use crate::scenario::SimConfig;

/// Seed used by the reference scenarios.
pub const TEST_SEED: u64 = 42;

/// Small city with a modest fleet and demand, seeded with [`TEST_SEED`].
pub fn test_config() -> SimConfig {
    SimConfig::default()
        .with_city_size(8)
        .with_vehicle_count(8)
        .with_request_rate(0.5)
        .with_seed(TEST_SEED)
}

/// A request between two locations with its wraparound distance filled in.
pub fn trip_draft(city_size: u32, origin: Location, destination: Location) -> TripDraft {
    let dx = origin.x.abs_diff(destination.x);
    let dy = origin.y.abs_diff(destination.y);
    let distance = dx.min(city_size - dx) + dy.min(city_size - dy);
    TripDraft {
        origin,
        destination,
        distance,
        cancel_after: None,
    }
}

/// One vehicle already dispatched to one trip.
///
/// # Panics
///
/// Panics if the dispatch transition is rejected, which would mean the
/// registries themselves are broken.
pub fn dispatched_pair(
    city_size: u32,
    vehicle_at: Location,
    origin: Location,
    destination: Location,
) -> (VehicleRegistry, TripRegistry, VehicleId, TripId) {
    let mut vehicles = VehicleRegistry::default();
    let mut trips = TripRegistry::default();
    let vehicle = vehicles.spawn(vehicle_at, Direction::North);
    let trip = trips.create(0, trip_draft(city_size, origin, destination));
    registry::dispatch(&mut vehicles, &mut trips, vehicle, trip, 0)
        .expect("fresh idle vehicle accepts a fresh trip");
    (vehicles, trips, vehicle, trip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;

    #[test]
    fn draft_distance_matches_the_city_metric() {
        let city = City::new(8).expect("city");
        let (a, b) = (Location::new(1, 7), Location::new(6, 0));
        assert_eq!(trip_draft(8, a, b).distance, city.distance(a, b));
    }

    #[test]
    fn dispatched_pair_is_consistent() {
        let (vehicles, trips, _, _) =
            dispatched_pair(8, Location::new(0, 0), Location::new(2, 2), Location::new(4, 2));
        assert_eq!(registry::validate(&vehicles, &trips), Ok(()));
    }
}
