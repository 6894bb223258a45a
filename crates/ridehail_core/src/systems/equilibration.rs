use bevy_ecs::prelude::{Res, ResMut};

use crate::city::City;
use crate::clock::BlockClock;
use crate::equilibration::{utility_error, EquilibrationController};
use crate::registry::VehicleRegistry;
use crate::rng::SimRng;
use crate::scenario::SimConfig;
use crate::telemetry::{BlockActivity, History};

use super::fleet::resize_fleet;

/// Feeds the block's utility error to the controller and applies any fleet
/// size it decides on. The new size also becomes the configured vehicle count
/// so the fleet stage keeps reconciling toward it.
#[allow(clippy::too_many_arguments)]
pub fn equilibration_system(
    mut config: ResMut<SimConfig>,
    clock: Res<BlockClock>,
    city: Res<City>,
    history: Res<History>,
    mut controller: ResMut<EquilibrationController>,
    mut rng: ResMut<SimRng>,
    mut vehicles: ResMut<VehicleRegistry>,
    mut activity: ResMut<BlockActivity>,
) {
    let stats = history.stats(&config.economics);
    if let Some(error) = utility_error(controller.config().method, &stats) {
        controller.observe(error);
    }
    let Some(report) = controller.poll(clock.now(), vehicles.len()) else {
        return;
    };

    config.vehicle_count = report.target;
    let change = resize_fleet(&mut vehicles, &city, rng.stream(), report.target);
    activity.vehicles_added += change.added;
    activity.vehicles_removed += change.removed;
    activity.cycle = Some(report);

    tracing::debug!(
        block = report.block,
        fleet = report.fleet,
        target_fleet = report.target,
        increment = report.increment,
        error = report.error,
        residual = report.residual,
        regime = ?report.regime,
        damping = report.effective_damping,
        next_cycle = report.next_cycle,
        "equilibration cycle"
    );
}
