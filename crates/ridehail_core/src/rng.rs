use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The single random stream of a run. Every stochastic stage draws from it in
/// schedule order, so a seed fixes the whole trajectory.
#[derive(Debug, Clone, Resource)]
pub struct SimRng {
    seed: u64,
    rng: StdRng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    pub fn stream(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
