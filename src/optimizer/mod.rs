//! Population-based multi-objective optimizers.
//!
//! [`Optimizer`] is the capability every optimizer offers to driver code:
//! evaluating designs against the problem, running generations, and exposing
//! the elite archive. [`GA`] realizes it with differential evolution.

pub mod archive;
pub mod core;
pub mod genetic;
pub mod options;

use ndarray::ArrayView2;

use crate::{error::Result, store::ArchiveStore};

pub use self::archive::{Archive, BinPreference, EpsilonDominanceArchiver, Individual};
pub use self::core::{EvaluatedPopulation, OptimizerCore, Problem};
pub use self::genetic::{GaBuilder, GA};
pub use self::options::{GaOptions, GaOptionsBuilder, MIN_POPULATION_SIZE};

pub trait Optimizer {
    /// Evaluates physical designs and returns objectives, constraints and penalties.
    fn evaluate(&self, x: &ArrayView2<'_, f64>) -> Result<EvaluatedPopulation>;

    /// Runs up to `itermax` generations, returning the number completed.
    fn iterate(&mut self, itermax: usize) -> Result<usize>;

    fn archive(&self) -> &Archive;

    fn problem(&self) -> &Problem;

    fn current_iteration(&self) -> usize;

    fn set_store(&mut self, store: Box<dyn ArchiveStore + Send>);
}
