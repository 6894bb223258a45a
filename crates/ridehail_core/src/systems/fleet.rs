use bevy_ecs::prelude::{Res, ResMut};
use rand::Rng;

use crate::city::{City, Direction};
use crate::registry::VehicleRegistry;
use crate::rng::SimRng;
use crate::scenario::SimConfig;
use crate::telemetry::BlockActivity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetChange {
    pub added: usize,
    pub removed: usize,
    /// Vehicles that should have been removed but were busy.
    pub shortfall: usize,
}

/// Grows the fleet with idle vehicles at random locations, or shrinks it by
/// removing idle vehicles, newest first.
pub fn resize_fleet<R: Rng>(
    vehicles: &mut VehicleRegistry,
    city: &City,
    rng: &mut R,
    target: usize,
) -> FleetChange {
    let current = vehicles.len();
    let mut change = FleetChange::default();
    if target > current {
        for _ in current..target {
            let location = city.random_location(rng);
            let direction = Direction::random(rng);
            vehicles.spawn(location, direction);
        }
        change.added = target - current;
    } else if target < current {
        let excess = current - target;
        change.removed = vehicles.remove_idle(excess);
        change.shortfall = excess - change.removed;
    }
    if change.shortfall > 0 {
        tracing::warn!(
            target_fleet = target,
            current = vehicles.len(),
            shortfall = change.shortfall,
            "too few idle vehicles to shrink the fleet"
        );
    }
    change
}

/// Brings the fleet to the configured size. Spawns the initial fleet at block 0
/// and applies live vehicle-count changes.
pub fn reconcile_fleet_system(
    config: Res<SimConfig>,
    city: Res<City>,
    mut rng: ResMut<SimRng>,
    mut vehicles: ResMut<VehicleRegistry>,
    mut activity: ResMut<BlockActivity>,
) {
    if vehicles.len() == config.vehicle_count {
        return;
    }
    let change = resize_fleet(&mut vehicles, &city, rng.stream(), config.vehicle_count);
    activity.vehicles_added += change.added;
    activity.vehicles_removed += change.removed;
}
