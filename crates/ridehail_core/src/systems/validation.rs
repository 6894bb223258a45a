use bevy_ecs::prelude::Res;

use crate::error::fatal;
use crate::registry::{validate, TripRegistry, VehicleRegistry};

/// End-of-block link check over both registries.
pub fn validate_links_system(vehicles: Res<VehicleRegistry>, trips: Res<TripRegistry>) {
    if let Err(violation) = validate(&vehicles, &trips) {
        fatal(violation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::city::{Direction, Location};
    use crate::registry::{dispatch, TripDraft};

    fn world_with_link(corrupt: bool) -> World {
        let mut vehicles = VehicleRegistry::default();
        let mut trips = TripRegistry::default();
        let v = vehicles.spawn(Location::new(0, 0), Direction::North);
        let t = trips.create(
            0,
            TripDraft {
                origin: Location::new(0, 1),
                destination: Location::new(0, 3),
                distance: 2,
                cancel_after: None,
            },
        );
        dispatch(&mut vehicles, &mut trips, v, t, 0).expect("dispatch");
        if corrupt {
            trips.get_mut(t).expect("trip").vehicle = None;
        }
        let mut world = World::new();
        world.insert_resource(vehicles);
        world.insert_resource(trips);
        world
    }

    #[test]
    fn consistent_links_pass() {
        let mut world = world_with_link(false);
        let mut schedule = Schedule::default();
        schedule.add_systems(validate_links_system);
        schedule.run(&mut world);
    }

    #[test]
    #[should_panic(expected = "registry invariant violated")]
    fn one_sided_link_is_fatal() {
        let mut world = world_with_link(true);
        let mut schedule = Schedule::default();
        schedule.add_systems(validate_links_system);
        schedule.run(&mut world);
    }
}
