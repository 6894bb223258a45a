mod support;

use ridehail_core::equilibration::{EquilibrationController, Regime, SETTLING_INTERVAL};
use ridehail_core::scenario::{
    Economics, EquilibrationConfig, EquilibrationMethod, EquilibrationMode,
};
use ridehail_core::test_helpers::test_config;

use support::engine::{engine, run_checked};
use support::plant::{drive, reversals, SyntheticPlant};

fn adaptive_price() -> EquilibrationConfig {
    EquilibrationConfig {
        method: EquilibrationMethod::Price,
        mode: EquilibrationMode::Adaptive { seed_damping: 1.0 },
        ..EquilibrationConfig::default()
    }
}

#[test]
fn adaptive_controller_settles_next_to_the_equilibrium() {
    let mut controller = EquilibrationController::new(adaptive_price()).expect("controller");
    let plant = SyntheticPlant { equilibrium: 12 };
    let trace = drive(&mut controller, plant, 20, 200);

    let last = *trace.last().expect("trace");
    assert!(last.abs_diff(12) <= 1, "settled at {last}");
    let tail = &trace[trace.len() - 40..];
    assert!(tail.iter().all(|v| v.abs_diff(12) <= 1), "tail {tail:?}");
    assert!(reversals(tail) <= 2);
    // The approach from above never overshoots.
    assert_eq!(reversals(&trace), 0);
    assert!(trace.iter().all(|&v| v >= 12));
}

#[test]
fn adaptive_cycles_start_after_the_settling_interval_and_respect_the_cap() {
    let mut controller = EquilibrationController::new(adaptive_price()).expect("controller");
    let plant = SyntheticPlant { equilibrium: 12 };
    let trace = drive(&mut controller, plant, 20, 30);

    let first_change = trace.iter().position(|&v| v != 20).expect("fleet moved");
    assert_eq!(first_change as u32, SETTLING_INTERVAL);
    // Far from equilibrium, steps are capped at 10% of the fleet.
    for pair in trace.windows(2) {
        let cap = ((pair[0] as f64 * 0.1).round() as usize).max(1);
        assert!(pair[0].abs_diff(pair[1]) <= cap, "{pair:?}");
    }
}

#[test]
fn fixed_mode_cycles_on_its_interval() {
    let config = EquilibrationConfig {
        method: EquilibrationMethod::Price,
        mode: EquilibrationMode::from_interval(5, 0.5),
        ..EquilibrationConfig::default()
    };
    let mut controller = EquilibrationController::new(config).expect("controller");
    let plant = SyntheticPlant { equilibrium: 30 };
    let trace = drive(&mut controller, plant, 20, 26);

    // e(20) = 0.5, so the first step is round(0.5 * 20 * 0.5) = 5 at block 5.
    assert_eq!(trace[4], 20);
    assert_eq!(trace[5], 25);
    assert_eq!(controller.cycles(), 5);
    assert!(controller.state().last_residual.is_none(), "fixed mode leaves adaptive state alone");
}

#[test]
fn persistent_oscillation_raises_damping() {
    let mut controller = EquilibrationController::new(adaptive_price()).expect("controller");
    let start = controller.state().damping;
    let mut block = 0;
    let mut sign = 1.0;
    let mut reports = Vec::new();
    while reports.len() < 8 {
        controller.observe(0.1 * sign);
        if let Some(report) = controller.poll(block, 40) {
            reports.push(report);
            sign = -sign;
        }
        block += 1;
    }
    assert!(reports.iter().all(|r| r.regime != Some(Regime::Far)));
    assert!(controller.state().damping > start);
}

#[test]
fn unprofitable_market_shrinks_the_fleet() {
    let config = test_config()
        .with_vehicle_count(20)
        .with_economics(Economics {
            reservation_wage: 1.0,
            ..Economics::default()
        })
        .with_equilibration(
            EquilibrationMethod::Price,
            EquilibrationMode::Adaptive { seed_damping: 1.0 },
        );
    let mut engine = engine(config);
    let mut cycles = 0;
    run_checked(&mut engine, 60, |_, summary| {
        if let Some(cycle) = summary.activity.cycle {
            cycles += 1;
            assert!(cycle.error < 0.0);
            assert!(cycle.target <= cycle.fleet);
        }
    });
    assert!(cycles > 0);
    assert!(engine.vehicles().len() < 20);
    assert!(engine.config().vehicle_count < 20);
    assert_eq!(engine.base_config().vehicle_count, 20);
}

#[test]
fn profitable_market_grows_the_fleet() {
    let config = test_config()
        .with_city_size(10)
        .with_vehicle_count(20)
        .with_request_rate(2.0)
        .with_economics(Economics {
            reservation_wage: 0.0,
            ..Economics::default()
        })
        .with_equilibration(
            EquilibrationMethod::Price,
            EquilibrationMode::Adaptive { seed_damping: 1.0 },
        );
    let mut engine = engine(config);
    engine.run(60);
    assert!(engine.vehicles().len() > 20, "fleet {}", engine.vehicles().len());
}

#[test]
fn enabling_equilibration_live_starts_cycles() {
    let mut engine = engine(
        test_config()
            .with_vehicle_count(20)
            .with_economics(Economics {
                reservation_wage: 1.0,
                ..Economics::default()
            }),
    );
    engine.run(10);
    assert_eq!(engine.controller().cycles(), 0);
    engine
        .update_parameters(
            &ridehail_core::ParameterUpdate::default()
                .with_equilibration_method(EquilibrationMethod::Price),
        )
        .expect("update");
    engine.run(20);
    assert!(engine.controller().cycles() > 0);
    assert!(engine.vehicles().len() < 20);
}
