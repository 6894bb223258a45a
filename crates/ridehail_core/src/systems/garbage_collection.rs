use bevy_ecs::prelude::ResMut;

use crate::registry::TripRegistry;
use crate::telemetry::BlockActivity;

/// Purges dead trips from the registry. Runs every `gc_interval` blocks.
pub fn garbage_collection_system(
    mut trips: ResMut<TripRegistry>,
    mut activity: ResMut<BlockActivity>,
) {
    let collected = trips.collect_garbage();
    activity.collected = collected;
    tracing::debug!(collected, live = trips.live_count(), "collected dead trips");
}
