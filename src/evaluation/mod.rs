//! # Evaluation
//!
//! The `Evaluator` trait is the seam between the optimizer and the model being
//! optimized. An evaluator receives a whole trial population of physical design
//! vectors (`[n, xdim]`) and returns one objective row and one constraint row per
//! design. The optimizer never looks inside: a potential-flow simulation, a
//! database-backed lookup and a closed-form test function all look the same.
//!
//! Adapters in [`adapters`] cover the common cases: per-design closures that are
//! evaluated in parallel, a feasibility guard that skips designs the model cannot
//! handle, and per-objective optimization directions.
//!
//! ## Example
//!
//! ```rust
//! use ndarray::{array, ArrayView2, Axis};
//! use paretoga::evaluation::{Evaluation, Evaluator, FnEvaluator};
//!
//! let sphere = FnEvaluator::new(|x: ArrayView2<'_, f64>| {
//!     let y = x.mapv(|v| v * v).sum_axis(Axis(1)).insert_axis(Axis(1));
//!     Ok(Evaluation::unconstrained(y))
//! });
//!
//! let result = sphere.evaluate(array![[1.0, 2.0], [0.0, 0.5]].view()).unwrap();
//! assert_eq!(result.objectives, array![[5.0], [0.25]]);
//! assert_eq!(result.constraints.dim(), (2, 0));
//! ```

pub mod adapters;

use ndarray::{Array2, ArrayView2};

use crate::error::BoxError;

pub use adapters::{
    Direction, DirectedEvaluator, GuardedEvaluator, RowEvaluator, DEFAULT_INFEASIBLE_FILL,
    DEFAULT_PARALLEL_THRESHOLD,
};

/// Raw output of one evaluator call: objectives `[n, ydim]` and constraints `[n, cdim]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objectives: Array2<f64>,
    pub constraints: Array2<f64>,
}

impl Evaluation {
    pub fn new(objectives: Array2<f64>, constraints: Array2<f64>) -> Self {
        Self {
            objectives,
            constraints,
        }
    }

    /// An evaluation without constraint columns.
    pub fn unconstrained(objectives: Array2<f64>) -> Self {
        let n = objectives.nrows();
        Self {
            objectives,
            constraints: Array2::zeros((n, 0)),
        }
    }
}

/// The fitness collaborator: maps a design matrix to objectives and constraints.
///
/// Lower objective values are better. Implementations report failures as a
/// [`BoxError`]; the optimizer aborts the generation and propagates it.
pub trait Evaluator {
    fn evaluate(&self, designs: ArrayView2<'_, f64>) -> Result<Evaluation, BoxError>;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, designs: ArrayView2<'_, f64>) -> Result<Evaluation, BoxError> {
        (**self).evaluate(designs)
    }
}

/// Wraps a closure over the whole design matrix.
#[derive(Clone)]
pub struct FnEvaluator<F> {
    f: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(ArrayView2<'_, f64>) -> Result<Evaluation, BoxError>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(ArrayView2<'_, f64>) -> Result<Evaluation, BoxError>,
{
    fn evaluate(&self, designs: ArrayView2<'_, f64>) -> Result<Evaluation, BoxError> {
        (self.f)(designs)
    }
}

impl<F> std::fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEvaluator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fn_evaluator_propagates_error() {
        let failing = FnEvaluator::new(|_x: ArrayView2<'_, f64>| Err("solver diverged".into()));
        let result = failing.evaluate(array![[1.0]].view());

        assert_eq!(result.unwrap_err().to_string(), "solver diverged");
    }

    #[test]
    fn test_boxed_evaluator() {
        let boxed: Box<dyn Evaluator> = Box::new(FnEvaluator::new(|x: ArrayView2<'_, f64>| {
            Ok(Evaluation::new(x.to_owned(), x.to_owned()))
        }));
        let result = boxed.evaluate(array![[1.0, 2.0]].view()).unwrap();

        assert_eq!(result.objectives, array![[1.0, 2.0]]);
        assert_eq!(result.constraints, array![[1.0, 2.0]]);
    }
}
