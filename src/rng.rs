//! # RandomNumberGenerator
//!
//! The `RandomNumberGenerator` struct is the single source of randomness of an
//! optimizer run. Every stochastic draw (initial population, donor sampling,
//! crossover masks) goes through it, so a run built from
//! [`RandomNumberGenerator::from_seed`] is reproducible generation by generation.
//!
//! ## Example
//!
//! ```rust
//! use paretoga::rng::RandomNumberGenerator;
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let population = rng.uniform_matrix(20, 3);
//! assert_eq!(population.dim(), (20, 3));
//! assert!(population.iter().all(|v| (0.0..1.0).contains(v)));
//! ```

use ndarray::Array2;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

/// A wrapper around the `rand` crate's `StdRng` that provides the draws the
/// optimizer needs.
#[derive(Clone, Debug)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible tests and benchmarks.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a single value uniformly from `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Draws an index uniformly from `0..n`.
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Draws a `[rows, cols]` matrix with entries uniform in `[0, 1)`.
    pub fn uniform_matrix(&mut self, rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |_| self.rng.gen::<f64>())
    }

    /// Samples `amount` distinct indices from `0..n`, never returning `exclude`.
    ///
    /// The caller guarantees `amount <= n - 1` and `exclude < n`.
    pub fn distinct_excluding(&mut self, n: usize, amount: usize, exclude: usize) -> Vec<usize> {
        index::sample(&mut self.rng, n - 1, amount)
            .into_iter()
            .map(|i| if i >= exclude { i + 1 } else { i })
            .collect()
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
