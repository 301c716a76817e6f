//! Injectable randomness for trending-slot sampling

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Picks `amount` distinct indices from `0..len`.
pub trait RandomSource: Send {
    fn sample(&mut self, len: usize, amount: usize) -> Vec<usize>;
}

/// `StdRng`-backed source. Seeded instances replay the same draws.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }
}

impl RandomSource for SeededRandom {
    fn sample(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        if amount == 0 {
            return Vec::new();
        }
        rand::seq::index::sample(&mut self.rng, len, amount).into_vec()
    }
}

/// Always takes the leading indices; disables variety for correctness tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstN;

impl RandomSource for FirstN {
    fn sample(&mut self, len: usize, amount: usize) -> Vec<usize> {
        (0..amount.min(len)).collect()
    }
}
