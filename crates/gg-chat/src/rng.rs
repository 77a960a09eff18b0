use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Injectable randomness for reply selection and emotion tie-breaks.
pub trait RandomSource: Send {
    /// Uniform in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
    /// Uniform in `0..bound`; `bound` must be non-zero.
    fn next_index(&mut self, bound: usize) -> usize;
    /// Seed for a generator that continues this conversation in another
    /// process.
    fn next_seed(&mut self) -> u64 {
        (self.next_unit() * 9_007_199_254_740_992.0) as u64
    }
}

/// `StdRng` behind the trait; identical seeds replay identical conversations.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound.max(1))
    }

    fn next_seed(&mut self) -> u64 {
        self.rng.gen()
    }
}
