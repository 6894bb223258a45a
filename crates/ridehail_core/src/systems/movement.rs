//! Movement stage: every vehicle advances at most one grid unit per block.
//!
//! Idle vehicles cruise when configured to, turning at random but never
//! doubling back. Dispatched vehicles head for the trip origin and vehicles
//! with a rider for the destination, closing the x gap first.

use bevy_ecs::prelude::{Res, ResMut};
use rand::Rng;

use crate::city::{City, Location};
use crate::entities::{Vehicle, VehiclePhase};
use crate::error::{fatal, InvariantViolation};
use crate::registry::{TripRegistry, VehicleRegistry};
use crate::rng::SimRng;
use crate::scenario::SimConfig;

/// Where a busy vehicle is heading: the origin while dispatched, the
/// destination while carrying the rider. `None` for idle vehicles.
pub(crate) fn route_target(
    vehicle: &Vehicle,
    trips: &TripRegistry,
) -> Result<Option<Location>, InvariantViolation> {
    if vehicle.phase == VehiclePhase::Idle {
        return Ok(None);
    }
    let trip_id = vehicle.trip.ok_or(InvariantViolation::VehicleLink {
        vehicle: vehicle.id,
        phase: vehicle.phase,
    })?;
    let trip = trips.get(trip_id).ok_or(InvariantViolation::DanglingTrip {
        vehicle: vehicle.id,
        trip: trip_id,
    })?;
    Ok(Some(match vehicle.phase {
        VehiclePhase::Dispatched => trip.origin,
        _ => trip.destination,
    }))
}

fn move_vehicles<R: Rng>(
    config: &SimConfig,
    city: &City,
    rng: &mut R,
    vehicles: &mut VehicleRegistry,
    trips: &TripRegistry,
) -> Result<(), InvariantViolation> {
    for vehicle in vehicles.iter_mut() {
        match route_target(vehicle, trips)? {
            Some(target) => {
                if let Some(direction) = city.heading(vehicle.location, target) {
                    vehicle.direction = direction;
                    vehicle.location = city.step(vehicle.location, direction);
                }
            }
            None if config.idle_vehicles_moving => {
                let choices = vehicle.direction.forward_choices();
                let direction = choices[rng.gen_range(0..choices.len())];
                vehicle.direction = direction;
                vehicle.location = city.step(vehicle.location, direction);
            }
            None => {}
        }
    }
    Ok(())
}

pub fn movement_system(
    config: Res<SimConfig>,
    city: Res<City>,
    mut rng: ResMut<SimRng>,
    mut vehicles: ResMut<VehicleRegistry>,
    trips: Res<TripRegistry>,
) {
    if let Err(violation) = move_vehicles(&config, &city, rng.stream(), &mut vehicles, &trips) {
        fatal(violation);
    }
}
