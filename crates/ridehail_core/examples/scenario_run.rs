//! Run a small market with adaptive price equilibration and print how the
//! fleet settles.
//!
//! Run with: RUST_LOG=ridehail_core=debug cargo run -p ridehail_core --example scenario_run

use ridehail_core::scenario::{Economics, EquilibrationMethod, EquilibrationMode, SimConfig};
use ridehail_core::{ControlCommand, ParameterUpdate, TimeStepEngine};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    const BLOCKS: u64 = 600;
    const REPORT_EVERY: u64 = 50;

    let config = SimConfig::default()
        .with_city_size(16)
        .with_vehicle_count(40)
        .with_request_rate(3.0)
        .with_economics(Economics {
            price: 1.0,
            commission: 0.25,
            reservation_wage: 0.35,
            demand_elasticity: 0.0,
        })
        .with_equilibration(
            EquilibrationMethod::Price,
            EquilibrationMode::Adaptive { seed_damping: 1.0 },
        )
        .with_seed(123);

    let mut engine = match TimeStepEngine::new(config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };

    println!("--- Scenario run (city 16, 40 vehicles, rate 3.0, seed 123) ---");
    println!("block  vehicles    P1    P2    P3  wait  ride  utility");
    for block in 0..BLOCKS {
        if block == BLOCKS / 2 {
            // Halfway through, demand doubles.
            let update = ParameterUpdate::default().with_request_rate(6.0);
            if let Err(err) = engine.apply(ControlCommand::UpdateParameters(update)) {
                eprintln!("update rejected: {err}");
            }
        }
        let summary = engine.step();
        if summary.block % REPORT_EVERY == 0 {
            let w = summary.window;
            println!(
                "{:5}  {:8}  {:.2}  {:.2}  {:.2}  {:4.1}  {:4.1}  {:+.3}",
                summary.block,
                summary.vehicles,
                w.p1,
                w.p2,
                w.p3,
                w.mean_wait.unwrap_or(0.0),
                w.mean_ride.unwrap_or(0.0),
                w.vehicle_utility,
            );
        }
    }

    let controller = engine.controller();
    println!("\nEquilibration cycles: {}", controller.cycles());
    println!("Final damping: {:.3}", controller.state().damping);
    println!("Converged: {}", controller.tracker().is_converged());
}
