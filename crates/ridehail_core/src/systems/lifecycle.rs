use bevy_ecs::prelude::ResMut;

use crate::error::fatal;
use crate::registry::TripRegistry;
use crate::telemetry::BlockActivity;

/// First stage of a block: clears the activity counters and moves trips that
/// finished last block to INACTIVE.
pub fn retire_finished_trips_system(
    mut trips: ResMut<TripRegistry>,
    mut activity: ResMut<BlockActivity>,
) {
    *activity = BlockActivity::default();
    match trips.retire_finished() {
        Ok(retired) => activity.retired = retired,
        Err(violation) => fatal(violation),
    }
}
