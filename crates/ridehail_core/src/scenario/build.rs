use bevy_ecs::prelude::World;

use crate::city::City;
use crate::clock::BlockClock;
use crate::dispatch::DispatchPolicy;
use crate::equilibration::EquilibrationController;
use crate::error::ConfigResult;
use crate::registry::{TripRegistry, VehicleRegistry};
use crate::rng::SimRng;
use crate::scenario::params::SimConfig;
use crate::telemetry::{BlockActivity, History, LatestSummary};

/// Builds a fresh world at block 0 with empty registries. The initial fleet is
/// spawned by the first block's fleet stage.
pub fn build_world(config: &SimConfig) -> ConfigResult<World> {
    config.validate()?;

    let mut world = World::new();
    world.insert_resource(City::new(config.city_size)?);
    world.insert_resource(BlockClock::default());
    world.insert_resource(SimRng::new(config.seed));
    world.insert_resource(VehicleRegistry::default());
    world.insert_resource(TripRegistry::default());
    world.insert_resource(DispatchPolicy::from_config(config));
    world.insert_resource(EquilibrationController::new(config.equilibration)?);
    world.insert_resource(History::new(config.results_window)?);
    world.insert_resource(BlockActivity::default());
    world.insert_resource(LatestSummary::default());
    world.insert_resource(config.clone());
    Ok(world)
}
