//! Trip demand: how many requests arrive in a block and where they go.

use rand::Rng;

use crate::city::{City, Location};
use crate::registry::TripDraft;
use crate::scenario::{CancellationConfig, SimConfig};

/// Draws before falling back to constructing a destination at a sampled distance.
const MAX_REJECTION_SAMPLING_ATTEMPTS: usize = 2000;

/// Request process derived from the live configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandModel {
    /// Expected requests per block after the price response.
    pub rate: f64,
    pub min_distance: u32,
    pub max_distance: u32,
    pub inhomogeneity: f64,
    pub cancellation: Option<CancellationConfig>,
}

impl DemandModel {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            rate: config.economics.effective_rate(config.request_rate),
            min_distance: config.min_trip_distance,
            max_distance: config.effective_max_trip_distance(),
            inhomogeneity: config.inhomogeneity,
            cancellation: config.cancellation,
        }
    }

    /// Upper bound on [`DemandModel::arrivals`].
    pub fn max_arrivals_per_block(&self) -> usize {
        self.rate.ceil() as usize
    }

    /// `floor(rate)` requests, plus one more with probability `frac(rate)`.
    pub fn arrivals<R: Rng>(&self, rng: &mut R) -> usize {
        let whole = self.rate.floor();
        let frac = self.rate - whole;
        let extra = frac > 0.0 && rng.gen_bool(frac);
        whole as usize + usize::from(extra)
    }

    pub fn origin<R: Rng>(&self, city: &City, rng: &mut R) -> Location {
        if self.inhomogeneity > 0.0 && rng.gen_bool(self.inhomogeneity) {
            city.random_central_location(rng)
        } else {
            city.random_location(rng)
        }
    }

    /// Uniform over destinations whose wraparound distance from `origin` lies
    /// within the configured bounds.
    pub fn destination<R: Rng>(&self, city: &City, origin: Location, rng: &mut R) -> Location {
        let max = self.max_distance.min(city.max_distance());
        let min = self.min_distance.min(max);
        for _ in 0..MAX_REJECTION_SAMPLING_ATTEMPTS {
            let candidate = city.random_location(rng);
            let distance = city.distance(origin, candidate);
            if (min..=max).contains(&distance) {
                return candidate;
            }
        }
        // Split a sampled distance over the two axes; each part stays within
        // half the city, so the wraparound distance is exact.
        let distance = rng.gen_range(min..=max);
        let half = city.size() / 2;
        let dx = distance.min(half);
        let dy = distance - dx;
        city.offset(origin, i64::from(dx), i64::from(dy))
    }

    pub fn draft<R: Rng>(&self, city: &City, rng: &mut R) -> TripDraft {
        let origin = self.origin(city, rng);
        let destination = self.destination(city, origin, rng);
        let cancel_after = self
            .cancellation
            .map(|window| rng.gen_range(window.min_wait..=window.max_wait));
        TripDraft {
            origin,
            destination,
            distance: city.distance(origin, destination),
            cancel_after,
        }
    }
}
