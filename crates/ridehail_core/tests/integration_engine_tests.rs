mod support;

use ridehail_core::scenario::DispatchMethod;
use ridehail_core::telemetry::BlockSnapshot;
use ridehail_core::test_helpers::test_config;
use ridehail_core::{ControlCommand, ParameterUpdate, SimConfig};

use support::engine::{engine, run_checked};

#[test]
fn phase_fractions_sum_to_one_every_block() {
    let mut engine = engine(test_config().with_request_rate(1.5));
    run_checked(&mut engine, 150, |_, summary| {
        let w = summary.window;
        assert!(
            (w.p1 + w.p2 + w.p3 - 1.0).abs() < 1e-9,
            "block {}: {} + {} + {}",
            summary.block,
            w.p1,
            w.p2,
            w.p3
        );
        assert_eq!(summary.vehicle_phases.total(), summary.vehicles);
    });
}

#[test]
fn links_stay_valid_under_every_dispatch_method() {
    for method in [
        DispatchMethod::Default,
        DispatchMethod::Random,
        DispatchMethod::Legacy,
        DispatchMethod::Forward,
    ] {
        let config = test_config()
            .with_request_rate(2.0)
            .with_dispatch(method)
            .with_cancellation(2, 8);
        let mut engine = engine(config);
        let mut completed = 0;
        run_checked(&mut engine, 120, |_, summary| completed += summary.activity.completions);
        assert!(completed > 0, "{method:?} completed no trips");
    }
}

#[test]
fn identical_seeds_give_identical_snapshots() {
    let config = test_config().with_request_rate(1.2).with_cancellation(1, 6);
    let mut a = engine(config.clone());
    let mut b = engine(config);
    for _ in 0..100 {
        a.step();
        b.step();
        assert_eq!(a.snapshot(), b.snapshot());
    }
}

#[test]
fn different_seeds_diverge() {
    let mut a = engine(test_config().with_seed(1));
    let mut b = engine(test_config().with_seed(2));
    a.run(20);
    b.run(20);
    assert_ne!(a.snapshot(), b.snapshot());
}

#[test]
fn reset_twice_equals_reset_once_equals_fresh() {
    let config = test_config().with_request_rate(1.0);
    let fresh = engine(config.clone());
    let fresh_snapshot: BlockSnapshot = fresh.snapshot();

    let mut once = engine(config.clone());
    once.run(30);
    once.apply(ControlCommand::Reset).expect("reset");

    let mut twice = engine(config);
    twice.run(17);
    twice.reset().expect("reset");
    twice.reset().expect("reset");

    for engine in [&once, &twice] {
        assert_eq!(engine.block(), 0);
        assert!(engine.vehicles().is_empty());
        assert!(engine.trips().is_empty());
        assert_eq!(engine.controller().cycles(), 0);
        assert_eq!(engine.history().blocks(), 0);
        assert_eq!(engine.snapshot(), fresh_snapshot);
    }

    let mut fresh = fresh;
    for _ in 0..25 {
        let expected = fresh.step();
        assert_eq!(once.step(), expected);
        assert_eq!(twice.step(), expected);
    }
}

#[test]
fn vehicle_count_update_applies_next_block_without_reset() {
    let mut engine = engine(test_config());
    engine.run(10);
    engine
        .apply(ControlCommand::UpdateParameters(
            ParameterUpdate::default().with_vehicle_count(14),
        ))
        .expect("update");
    assert_eq!(engine.block(), 10);

    let summary = engine.step();
    assert_eq!(summary.block, 10);
    assert_eq!(summary.vehicles, 14);
    assert_eq!(summary.activity.vehicles_added, 6);
    assert_eq!(engine.base_config().vehicle_count, 14);
}

#[test]
fn fleet_shrinks_once_vehicles_fall_idle() {
    let mut engine = engine(test_config());
    engine.run(20);
    engine
        .update_parameters(
            &ParameterUpdate::default()
                .with_vehicle_count(2)
                .with_request_rate(0.0),
        )
        .expect("update");

    let mut shrunk_at = None;
    run_checked(&mut engine, 40, |_, summary| {
        if summary.vehicles == 2 && shrunk_at.is_none() {
            shrunk_at = Some(summary.block);
        }
    });
    assert!(shrunk_at.is_some(), "fleet never reached 2 vehicles");
    assert_eq!(engine.vehicles().len(), 2);
}

#[test]
fn city_size_update_resets_with_the_new_city() {
    let mut engine = engine(test_config());
    engine.run(12);
    engine
        .update_parameters(
            &ParameterUpdate::default()
                .with_city_size(12)
                .with_request_rate(1.0),
        )
        .expect("update");

    assert_eq!(engine.block(), 0);
    assert!(engine.vehicles().is_empty());
    assert_eq!(engine.config().city_size, 12);
    assert_eq!(engine.config().request_rate, 1.0);

    let summary = engine.step();
    assert_eq!(summary.vehicles, 8);
    let snapshot = engine.snapshot();
    assert!(snapshot
        .vehicles
        .iter()
        .all(|v| v.location.x < 12 && v.location.y < 12));
}

#[test]
fn invalid_construction_is_rejected() {
    assert!(ridehail_core::TimeStepEngine::new(SimConfig::default().with_results_window(0)).is_err());
    assert!(ridehail_core::TimeStepEngine::new(SimConfig::default().with_gc_interval(0)).is_err());
    assert!(
        ridehail_core::TimeStepEngine::new(SimConfig::default().with_trip_distance(5, Some(2)))
            .is_err()
    );
}

#[test]
fn snapshot_lists_live_trips_only() {
    let mut engine = engine(test_config().with_request_rate(1.0).with_gc_interval(1000));
    engine.run(60);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.trips.len(), snapshot.summary.live_trips);
    assert!(snapshot.trips.iter().all(|t| t.phase.is_live()));
    assert!(snapshot.summary.dead_trips > 0);
}
