//! Block runner: one schedule run per block, clock advanced outside systems.
//!
//! The stages of a block run in a fixed order on a single thread, so every
//! draw from [`SimRng`](crate::rng::SimRng) happens in the same sequence for
//! a given seed. The clock is advanced by [`run_block`] after the schedule has
//! finished, never by a system.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};

use crate::clock::BlockClock;
use crate::equilibration::EquilibrationController;
use crate::scenario::SimConfig;
use crate::systems::{
    demand::demand_system,
    dispatch::dispatch_system,
    equilibration::equilibration_system,
    fleet::reconcile_fleet_system,
    garbage_collection::garbage_collection_system,
    history::record_history_system,
    lifecycle::retire_finished_trips_system,
    movement::movement_system,
    summary::summary_system,
    trip_progress::trip_progress_system,
    validation::validate_links_system,
};
use crate::telemetry::{BlockSummary, LatestSummary};

/// Condition: an equilibration method is selected.
fn equilibration_enabled(controller: Option<Res<EquilibrationController>>) -> bool {
    controller.is_some_and(|c| c.is_enabled())
}

/// Condition: this block is a garbage-collection block.
fn garbage_collection_due(clock: Option<Res<BlockClock>>, config: Option<Res<SimConfig>>) -> bool {
    let (Some(clock), Some(config)) = (clock, config) else {
        return false;
    };
    clock.is_multiple_of(config.gc_interval)
}

/// Builds the block schedule. Stage order:
///
/// 1. retire trips that finished last block, clear the activity counters
/// 2. reconcile the fleet with the configured vehicle count
/// 3. move vehicles
/// 4. generate requests
/// 5. dispatch
/// 6. pickups, drop-offs and cancellations
/// 7. record history
/// 8. equilibration (when enabled)
/// 9. garbage collection (every `gc_interval` blocks)
/// 10. link validation
/// 11. publish the block summary
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            retire_finished_trips_system,
            reconcile_fleet_system,
            movement_system,
            demand_system,
            dispatch_system,
            trip_progress_system,
            record_history_system,
            equilibration_system.run_if(equilibration_enabled),
            garbage_collection_system.run_if(garbage_collection_due),
            validate_links_system,
            summary_system,
        )
            .chain(),
    );
    schedule
}

/// Runs one block and advances the clock. Returns the block's summary.
pub fn run_block(world: &mut World, schedule: &mut Schedule) -> BlockSummary {
    schedule.run(world);
    let summary = world.resource::<LatestSummary>().0.clone();
    world.resource_mut::<BlockClock>().advance();
    summary
}

/// Runs `blocks` blocks and returns the last summary, if any block ran.
pub fn run_blocks(world: &mut World, schedule: &mut Schedule, blocks: u64) -> Option<BlockSummary> {
    let mut last = None;
    for _ in 0..blocks {
        last = Some(run_block(world, schedule));
    }
    last
}

#[cfg(test)]
mod end_to_end_tests {
    use super::*;

    use crate::entities::TripPhase;
    use crate::registry::{TripRegistry, VehicleRegistry};
    use crate::scenario::build_world;

    #[test]
    fn first_block_spawns_the_fleet_and_reports_block_zero() {
        let config = SimConfig::default().with_vehicle_count(5).with_request_rate(1.0);
        let mut world = build_world(&config).expect("world");
        let mut schedule = simulation_schedule();

        let summary = run_block(&mut world, &mut schedule);
        assert_eq!(summary.block, 0);
        assert_eq!(summary.vehicles, 5);
        assert_eq!(summary.activity.requests, 1);
        assert_eq!(world.resource::<BlockClock>().now(), 1);
    }

    #[test]
    fn trips_are_served_end_to_end() {
        let config = SimConfig::default()
            .with_vehicle_count(6)
            .with_request_rate(0.5)
            .with_seed(11);
        let mut world = build_world(&config).expect("world");
        let mut schedule = simulation_schedule();

        let mut completed = 0;
        for _ in 0..200 {
            let summary = run_block(&mut world, &mut schedule);
            completed += summary.activity.completions;
        }
        assert!(completed > 0, "no trip completed in 200 blocks");

        let trips = world.resource::<TripRegistry>();
        let vehicles = world.resource::<VehicleRegistry>();
        assert_eq!(crate::registry::validate(vehicles, trips), Ok(()));
        for trip in trips.iter_all().filter(|t| t.phase == TripPhase::Completed) {
            assert!(trip.requested_at <= trip.matched_at.expect("matched"));
            assert!(trip.matched_at <= trip.pickup_at);
            assert!(trip.pickup_at <= trip.dropoff_at);
        }
    }

    #[test]
    fn garbage_collection_runs_on_its_interval() {
        let config = SimConfig::default()
            .with_vehicle_count(8)
            .with_request_rate(1.0)
            .with_gc_interval(5);
        let mut world = build_world(&config).expect("world");
        let mut schedule = simulation_schedule();
        for block in 0..30u64 {
            let summary = run_block(&mut world, &mut schedule);
            if block > 0 && block % 5 == 0 {
                assert_eq!(summary.dead_trips, 0, "block {block}");
            }
        }
    }
}
