//! Pickups, drop-offs and cancellations at the end of a block's movement.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::BlockClock;
use crate::entities::{TripPhase, VehicleId, VehiclePhase};
use crate::error::{fatal, InvariantViolation};
use crate::registry::{self, TripRegistry, VehicleRegistry};
use crate::telemetry::BlockActivity;

use super::movement::route_target;

/// Applies every transition a vehicle has reached at its current location.
/// Zero-length legs chain within the block: a vehicle dispatched to a trip
/// whose origin equals its destination picks up and drops off at once.
fn progress_vehicle(
    vehicles: &mut VehicleRegistry,
    trips: &mut TripRegistry,
    activity: &mut BlockActivity,
    vehicle_id: VehicleId,
    now: u64,
) -> Result<(), InvariantViolation> {
    loop {
        let vehicle = vehicles
            .get(vehicle_id)
            .ok_or(InvariantViolation::UnknownVehicle(vehicle_id))?;
        let Some(target) = route_target(vehicle, trips)? else {
            return Ok(());
        };
        if vehicle.location != target {
            return Ok(());
        }
        let phase = vehicle.phase;
        match phase {
            VehiclePhase::Dispatched => {
                registry::pick_up(vehicles, trips, vehicle_id, now)?;
            }
            VehiclePhase::WithRider => {
                let dropoff = registry::drop_off(vehicles, trips, vehicle_id, now)?;
                let trip = trips
                    .get(dropoff.completed)
                    .ok_or(InvariantViolation::UnknownTrip(dropoff.completed))?;
                activity.completions += 1;
                activity.wait_blocks += trip.wait_time().unwrap_or(0);
                activity.ride_blocks += trip.ride_time().unwrap_or(0);
            }
            VehiclePhase::Idle => return Ok(()),
        }
    }
}

fn progress_trips(
    vehicles: &mut VehicleRegistry,
    trips: &mut TripRegistry,
    activity: &mut BlockActivity,
    now: u64,
) -> Result<(), InvariantViolation> {
    for vehicle_id in vehicles.ids() {
        progress_vehicle(vehicles, trips, activity, vehicle_id, now)?;
    }
    for trip_id in trips.ids_in(TripPhase::Unassigned) {
        let expired = trips
            .get(trip_id)
            .is_some_and(|trip| trip.has_waited_too_long(now));
        if expired {
            registry::cancel(trips, trip_id, now)?;
            activity.cancellations += 1;
        }
    }
    Ok(())
}

pub fn trip_progress_system(
    clock: Res<BlockClock>,
    mut vehicles: ResMut<VehicleRegistry>,
    mut trips: ResMut<TripRegistry>,
    mut activity: ResMut<BlockActivity>,
) {
    if let Err(violation) = progress_trips(&mut vehicles, &mut trips, &mut activity, clock.now()) {
        fatal(violation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::city::{Direction, Location};
    use crate::registry::TripDraft;

    fn draft(origin: Location, destination: Location, cancel_after: Option<u32>) -> TripDraft {
        TripDraft {
            origin,
            destination,
            distance: 0,
            cancel_after,
        }
    }

    fn world(vehicles: VehicleRegistry, trips: TripRegistry, block: u64) -> World {
        let mut world = World::new();
        let mut clock = BlockClock::default();
        for _ in 0..block {
            clock.advance();
        }
        world.insert_resource(clock);
        world.insert_resource(vehicles);
        world.insert_resource(trips);
        world.insert_resource(BlockActivity::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(trip_progress_system);
        schedule.run(world);
    }

    #[test]
    fn zero_length_trip_completes_in_the_dispatch_block() {
        let here = Location::new(2, 2);
        let mut vehicles = VehicleRegistry::default();
        let mut trips = TripRegistry::default();
        let v = vehicles.spawn(here, Direction::East);
        let t = trips.create(3, draft(here, here, None));
        registry::dispatch(&mut vehicles, &mut trips, v, t, 3).expect("dispatch");

        let mut world = world(vehicles, trips, 3);
        run(&mut world);

        let trip = world.resource::<TripRegistry>().get(t).cloned().expect("trip");
        assert_eq!(trip.phase, TripPhase::Completed);
        assert_eq!(trip.wait_time(), Some(0));
        assert_eq!(trip.ride_time(), Some(0));
        let vehicles = world.resource::<VehicleRegistry>();
        assert_eq!(vehicles.get(v).map(|v| v.phase), Some(VehiclePhase::Idle));
        assert_eq!(world.resource::<BlockActivity>().completions, 1);
    }

    #[test]
    fn vehicle_short_of_the_origin_keeps_driving() {
        let mut vehicles = VehicleRegistry::default();
        let mut trips = TripRegistry::default();
        let v = vehicles.spawn(Location::new(0, 0), Direction::East);
        let t = trips.create(0, draft(Location::new(1, 0), Location::new(2, 0), None));
        registry::dispatch(&mut vehicles, &mut trips, v, t, 0).expect("dispatch");

        let mut world = world(vehicles, trips, 1);
        run(&mut world);
        let trips = world.resource::<TripRegistry>();
        assert_eq!(trips.get(t).map(|t| t.phase), Some(TripPhase::Waiting));
    }

    #[test]
    fn unassigned_trip_cancels_once_its_patience_runs_out() {
        let mut trips = TripRegistry::default();
        let t = trips.create(0, draft(Location::new(1, 1), Location::new(3, 1), Some(2)));

        let mut patient = world(VehicleRegistry::default(), trips.clone(), 2);
        run(&mut patient);
        assert_eq!(
            patient.resource::<TripRegistry>().get(t).map(|t| t.phase),
            Some(TripPhase::Unassigned)
        );

        let mut expired = world(VehicleRegistry::default(), trips, 3);
        run(&mut expired);
        let trip = expired.resource::<TripRegistry>().get(t).cloned().expect("trip");
        assert_eq!(trip.phase, TripPhase::Cancelled);
        assert_eq!(trip.cancelled_at, Some(3));
        assert_eq!(expired.resource::<BlockActivity>().cancellations, 1);
    }
}
