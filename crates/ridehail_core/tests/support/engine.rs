use ridehail_core::registry;
use ridehail_core::telemetry::BlockSummary;
use ridehail_core::{SimConfig, TimeStepEngine};

pub fn engine(config: SimConfig) -> TimeStepEngine {
    TimeStepEngine::new(config).expect("valid test configuration")
}

/// Runs `blocks` blocks, checking registry links after each, and hands every
/// summary to `check`.
pub fn run_checked<F>(engine: &mut TimeStepEngine, blocks: u64, mut check: F)
where
    F: FnMut(&TimeStepEngine, &BlockSummary),
{
    for _ in 0..blocks {
        let summary = engine.step();
        if let Err(violation) = registry::validate(engine.vehicles(), engine.trips()) {
            panic!("block {}: {violation}", summary.block);
        }
        check(engine, &summary);
    }
}
