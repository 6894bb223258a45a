use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::BlockClock;
use crate::registry::{TripRegistry, VehicleRegistry};
use crate::scenario::SimConfig;
use crate::telemetry::{BlockActivity, BlockSummary, History, LatestSummary, PhaseCounts, TripCounts};

/// Last stage of a block: publishes the end-of-block aggregates.
pub fn summary_system(
    config: Res<SimConfig>,
    clock: Res<BlockClock>,
    vehicles: Res<VehicleRegistry>,
    trips: Res<TripRegistry>,
    history: Res<History>,
    activity: Res<BlockActivity>,
    mut latest: ResMut<LatestSummary>,
) {
    let summary = BlockSummary {
        block: clock.now(),
        vehicles: vehicles.len(),
        vehicle_phases: PhaseCounts::of(&vehicles),
        trip_phases: TripCounts::of(&trips),
        live_trips: trips.live_count(),
        dead_trips: trips.dead_count(),
        activity: *activity,
        window: history.stats(&config.economics),
    };
    tracing::trace!(
        block = summary.block,
        vehicles = summary.vehicles,
        live_trips = summary.live_trips,
        dead_trips = summary.dead_trips,
        "block summary"
    );
    latest.0 = summary;
}
