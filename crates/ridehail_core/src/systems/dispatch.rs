use bevy_ecs::prelude::{Res, ResMut};

use crate::city::City;
use crate::clock::BlockClock;
use crate::dispatch::{check_assignments, DispatchPolicy, TripRequest, VehicleCandidate};
use crate::entities::{TripPhase, VehiclePhase};
use crate::error::{fatal, InvariantViolation};
use crate::registry::{self, TripRegistry, VehicleRegistry};
use crate::rng::SimRng;
use crate::telemetry::BlockActivity;

/// Vehicles that may take a trip this block. Vehicles finishing a ride are
/// offered at their drop-off point when the policy looks ahead.
fn candidates(
    policy: &DispatchPolicy,
    city: &City,
    vehicles: &VehicleRegistry,
    trips: &TripRegistry,
) -> Result<Vec<VehicleCandidate>, InvariantViolation> {
    let mut candidates = Vec::new();
    for vehicle in vehicles.iter() {
        match vehicle.phase {
            VehiclePhase::Idle => candidates.push(VehicleCandidate::idle(vehicle.id, vehicle.location)),
            VehiclePhase::WithRider
                if policy.considers_busy_vehicles() && vehicle.next_trip.is_none() =>
            {
                let trip_id = vehicle.trip.ok_or(InvariantViolation::VehicleLink {
                    vehicle: vehicle.id,
                    phase: vehicle.phase,
                })?;
                let trip = trips.get(trip_id).ok_or(InvariantViolation::DanglingTrip {
                    vehicle: vehicle.id,
                    trip: trip_id,
                })?;
                candidates.push(VehicleCandidate::finishing(
                    vehicle.id,
                    trip.destination,
                    city.distance(vehicle.location, trip.destination),
                ));
            }
            _ => {}
        }
    }
    Ok(candidates)
}

fn dispatch_block(
    policy: &DispatchPolicy,
    city: &City,
    rng: &mut SimRng,
    vehicles: &mut VehicleRegistry,
    trips: &mut TripRegistry,
    now: u64,
) -> Result<usize, InvariantViolation> {
    let requests: Vec<TripRequest> = trips
        .iter_live()
        .filter(|t| t.phase == TripPhase::Unassigned)
        .map(|t| TripRequest {
            id: t.id,
            origin: t.origin,
        })
        .collect();
    if requests.is_empty() {
        return Ok(0);
    }
    let candidates = candidates(policy, city, vehicles, trips)?;
    let assignments = policy.assign(city, &candidates, &requests, rng.stream());
    check_assignments(&assignments)?;

    for assignment in &assignments {
        let idle = vehicles
            .get(assignment.vehicle)
            .map(|v| v.is_idle())
            .ok_or(InvariantViolation::UnknownVehicle(assignment.vehicle))?;
        if idle {
            registry::dispatch(vehicles, trips, assignment.vehicle, assignment.trip, now)?;
        } else {
            registry::forward_dispatch(vehicles, trips, assignment.vehicle, assignment.trip, now)?;
        }
    }
    Ok(assignments.len())
}

/// Matches unassigned trips to vehicles with the active dispatch policy.
pub fn dispatch_system(
    policy: Res<DispatchPolicy>,
    city: Res<City>,
    clock: Res<BlockClock>,
    mut rng: ResMut<SimRng>,
    mut vehicles: ResMut<VehicleRegistry>,
    mut trips: ResMut<TripRegistry>,
    mut activity: ResMut<BlockActivity>,
) {
    match dispatch_block(&policy, &city, &mut rng, &mut vehicles, &mut trips, clock.now()) {
        Ok(matched) => activity.matches += matched,
        Err(violation) => fatal(violation),
    }
}
