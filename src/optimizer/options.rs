//! # GaOptions
//!
//! The `GaOptions` struct holds the tuning parameters of the differential-evolution
//! genetic algorithm: population (and archive) size, epsilon-dominance bin count,
//! mutation scale, crossover probability, penalty policy and the bin preference
//! of the epsilon-dominance archiver.
//!
//! ## Example
//!
//! ```rust
//! use paretoga::optimizer::options::GaOptions;
//!
//! // Create a new GaOptions instance with custom parameters
//! let custom_options = GaOptions::new(40, 8, 0.8, 0.9);
//!
//! // Create a new GaOptions instance with default parameters
//! let default_options = GaOptions::default();
//! assert_eq!(default_options.get_population_size(), 20);
//! ```
//!
//! Options are only checked when an optimizer is built from them (or by
//! calling [`GaOptions::validate`]).

use crate::{
    error::{OptimizerError, Result},
    optimizer::archive::BinPreference,
    penalty::PenaltyPolicy,
};

/// Smallest population that allows three distinct donors besides the target.
pub const MIN_POPULATION_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaOptions {
    population_size: usize,
    eps_dominance_bins: usize,
    mutation: f64,
    crossover_probability: f64,
    penalty: PenaltyPolicy,
    bin_preference: BinPreference,
}

impl GaOptions {
    pub fn new(
        population_size: usize,
        eps_dominance_bins: usize,
        mutation: f64,
        crossover_probability: f64,
    ) -> Self {
        Self {
            population_size,
            eps_dominance_bins,
            mutation,
            crossover_probability,
            penalty: PenaltyPolicy::default(),
            bin_preference: BinPreference::default(),
        }
    }

    pub fn get_population_size(&self) -> usize {
        self.population_size
    }

    pub fn get_eps_dominance_bins(&self) -> usize {
        self.eps_dominance_bins
    }

    /// Scale `F` of the difference vector in `a + F * (b - c)`.
    pub fn get_mutation(&self) -> f64 {
        self.mutation
    }

    pub fn get_crossover_probability(&self) -> f64 {
        self.crossover_probability
    }

    pub fn get_penalty(&self) -> &PenaltyPolicy {
        &self.penalty
    }

    pub fn get_bin_preference(&self) -> BinPreference {
        self.bin_preference
    }

    pub fn set_population_size(&mut self, population_size: usize) {
        self.population_size = population_size;
    }

    pub fn set_eps_dominance_bins(&mut self, bins: usize) {
        self.eps_dominance_bins = bins;
    }

    pub fn set_mutation(&mut self, mutation: f64) {
        self.mutation = mutation;
    }

    pub fn set_crossover_probability(&mut self, crossover_probability: f64) {
        self.crossover_probability = crossover_probability;
    }

    pub fn set_penalty(&mut self, penalty: PenaltyPolicy) {
        self.penalty = penalty;
    }

    pub fn set_bin_preference(&mut self, bin_preference: BinPreference) {
        self.bin_preference = bin_preference;
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::InsufficientPopulation`] if the population size is below 4
    /// - [`OptimizerError::Configuration`] if the bin count is below 2, the mutation
    ///   scale is not a positive finite number, the crossover probability lies
    ///   outside `[0, 1]` or the penalty policy is invalid
    pub fn validate(&self) -> Result<()> {
        if self.population_size < MIN_POPULATION_SIZE {
            return Err(OptimizerError::InsufficientPopulation(self.population_size));
        }

        if self.eps_dominance_bins < 2 {
            return Err(OptimizerError::Configuration(format!(
                "Epsilon dominance bins must be at least 2, got {}",
                self.eps_dominance_bins
            )));
        }

        if !self.mutation.is_finite() || self.mutation <= 0.0 {
            return Err(OptimizerError::Configuration(format!(
                "Mutation scale must be positive and finite, got {}",
                self.mutation
            )));
        }

        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(OptimizerError::Configuration(format!(
                "Crossover probability must be in [0, 1], got {}",
                self.crossover_probability
            )));
        }

        self.penalty.validate()
    }

    /// Returns a builder for creating a `GaOptions` instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use paretoga::optimizer::options::GaOptions;
    /// use paretoga::optimizer::archive::BinPreference;
    ///
    /// let options = GaOptions::builder()
    ///     .population_size(50)
    ///     .eps_dominance_bins(10)
    ///     .mutation(0.6)
    ///     .crossover_probability(0.9)
    ///     .bin_preference(BinPreference::CloserToEdge)
    ///     .build();
    /// assert!(options.validate().is_ok());
    /// ```
    pub fn builder() -> GaOptionsBuilder {
        GaOptionsBuilder::default()
    }
}

impl Default for GaOptions {
    fn default() -> Self {
        Self {
            population_size: 20,
            eps_dominance_bins: 6,
            mutation: 0.5,
            crossover_probability: 0.7,
            penalty: PenaltyPolicy::default(),
            bin_preference: BinPreference::default(),
        }
    }
}

/// Builder for `GaOptions`.
///
/// Provides a fluent interface for constructing `GaOptions` instances.
#[derive(Debug, Clone, Default)]
pub struct GaOptionsBuilder {
    population_size: Option<usize>,
    eps_dominance_bins: Option<usize>,
    mutation: Option<f64>,
    crossover_probability: Option<f64>,
    penalty: Option<PenaltyPolicy>,
    bin_preference: Option<BinPreference>,
}

impl GaOptionsBuilder {
    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    pub fn eps_dominance_bins(mut self, value: usize) -> Self {
        self.eps_dominance_bins = Some(value);
        self
    }

    pub fn mutation(mut self, value: f64) -> Self {
        self.mutation = Some(value);
        self
    }

    pub fn crossover_probability(mut self, value: f64) -> Self {
        self.crossover_probability = Some(value);
        self
    }

    pub fn penalty(mut self, value: PenaltyPolicy) -> Self {
        self.penalty = Some(value);
        self
    }

    pub fn bin_preference(mut self, value: BinPreference) -> Self {
        self.bin_preference = Some(value);
        self
    }

    /// Builds the `GaOptions` instance, filling unset fields with defaults.
    pub fn build(self) -> GaOptions {
        let defaults = GaOptions::default();
        GaOptions {
            population_size: self.population_size.unwrap_or(defaults.population_size),
            eps_dominance_bins: self
                .eps_dominance_bins
                .unwrap_or(defaults.eps_dominance_bins),
            mutation: self.mutation.unwrap_or(defaults.mutation),
            crossover_probability: self
                .crossover_probability
                .unwrap_or(defaults.crossover_probability),
            penalty: self.penalty.unwrap_or(defaults.penalty),
            bin_preference: self.bin_preference.unwrap_or(defaults.bin_preference),
        }
    }
}
