use ridehail_core::equilibration::EquilibrationController;

/// Market whose utility error is zero at `equilibrium` vehicles:
/// `e(v) = (equilibrium - v) / v`.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticPlant {
    pub equilibrium: usize,
}

impl SyntheticPlant {
    pub fn error(&self, fleet: usize) -> f64 {
        (self.equilibrium as f64 - fleet as f64) / fleet as f64
    }
}

/// Drives the controller against the plant for `blocks` blocks, one error
/// sample per block, and returns the fleet size after every block.
pub fn drive(
    controller: &mut EquilibrationController,
    plant: SyntheticPlant,
    start: usize,
    blocks: u64,
) -> Vec<usize> {
    let mut fleet = start;
    let mut trace = Vec::with_capacity(blocks as usize);
    for block in 0..blocks {
        controller.observe(plant.error(fleet));
        if let Some(report) = controller.poll(block, fleet) {
            fleet = report.target;
        }
        trace.push(fleet);
    }
    trace
}

/// Number of direction changes in a fleet trajectory.
pub fn reversals(trace: &[usize]) -> usize {
    let mut last = 0i64;
    let mut count = 0;
    for pair in trace.windows(2) {
        let sign = (pair[1] as i64 - pair[0] as i64).signum();
        if sign != 0 {
            if last != 0 && sign != last {
                count += 1;
            }
            last = sign;
        }
    }
    count
}
