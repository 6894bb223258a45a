use bevy_ecs::prelude::{Res, ResMut};

use crate::registry::VehicleRegistry;
use crate::telemetry::{BlockActivity, History, PhaseCounts};

/// Appends this block's phase counts and trip activity to the rolling window.
pub fn record_history_system(
    vehicles: Res<VehicleRegistry>,
    activity: Res<BlockActivity>,
    mut history: ResMut<History>,
) {
    history.record(PhaseCounts::of(&vehicles), &activity);
}
