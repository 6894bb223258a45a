use bevy_ecs::prelude::{Res, ResMut};

use crate::city::City;
use crate::clock::BlockClock;
use crate::registry::TripRegistry;
use crate::rng::SimRng;
use crate::scenario::SimConfig;
use crate::spawner::DemandModel;
use crate::telemetry::BlockActivity;

/// Draws this block's trip requests from the live configuration.
pub fn demand_system(
    config: Res<SimConfig>,
    city: Res<City>,
    clock: Res<BlockClock>,
    mut rng: ResMut<SimRng>,
    mut trips: ResMut<TripRegistry>,
    mut activity: ResMut<BlockActivity>,
) {
    let demand = DemandModel::from_config(&config);
    let rng = rng.stream();
    let arrivals = demand.arrivals(rng);
    for _ in 0..arrivals {
        let draft = demand.draft(&city, rng);
        trips.create(clock.now(), draft);
    }
    activity.requests += arrivals;
}
