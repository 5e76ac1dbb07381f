use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::debug;

use super::{Evaluation, Evaluator};
use crate::error::BoxError;

/// Minimum number of designs before a [`RowEvaluator`] evaluates in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

/// Objective and constraint value given to designs rejected by a [`GuardedEvaluator`].
pub const DEFAULT_INFEASIBLE_FILL: f64 = 10.0;

/// Evaluates every design independently with a per-design closure.
///
/// The closure returns `(objectives, constraints)` for one design. Once the
/// population reaches the parallel threshold the designs are evaluated on the
/// rayon thread pool; rows are re-assembled in their original order, so the
/// result never depends on scheduling.
///
/// # Example
///
/// ```rust
/// use ndarray::{array, ArrayView1};
/// use paretoga::evaluation::{Evaluator, RowEvaluator};
///
/// let evaluator = RowEvaluator::new(|x: ArrayView1<'_, f64>| {
///     Ok((vec![x[0], -x[0]], vec![x[0] * 2.0]))
/// })
/// .with_parallel_threshold(2);
///
/// let result = evaluator.evaluate(array![[1.0], [3.0]].view()).unwrap();
/// assert_eq!(result.objectives, array![[1.0, -1.0], [3.0, -3.0]]);
/// assert_eq!(result.constraints, array![[2.0], [6.0]]);
/// ```
#[derive(Clone)]
pub struct RowEvaluator<F> {
    f: F,
    parallel_threshold: usize,
}

impl<F> RowEvaluator<F>
where
    F: Fn(ArrayView1<'_, f64>) -> Result<(Vec<f64>, Vec<f64>), BoxError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Sets the minimum number of designs evaluated in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}

impl<F> Evaluator for RowEvaluator<F>
where
    F: Fn(ArrayView1<'_, f64>) -> Result<(Vec<f64>, Vec<f64>), BoxError> + Send + Sync,
{
    fn evaluate(&self, designs: ArrayView2<'_, f64>) -> Result<Evaluation, BoxError> {
        let n = designs.nrows();

        let rows: Vec<(Vec<f64>, Vec<f64>)> = if n >= self.parallel_threshold {
            (0..n)
                .into_par_iter()
                .map(|i| (self.f)(designs.row(i)))
                .collect::<Result<_, BoxError>>()?
        } else {
            (0..n)
                .map(|i| (self.f)(designs.row(i)))
                .collect::<Result<_, BoxError>>()?
        };

        let ydim = rows.first().map_or(0, |(y, _)| y.len());
        let cdim = rows.first().map_or(0, |(_, c)| c.len());
        let mut objectives = Vec::with_capacity(n * ydim);
        let mut constraints = Vec::with_capacity(n * cdim);

        for (i, (y, c)) in rows.into_iter().enumerate() {
            if y.len() != ydim || c.len() != cdim {
                return Err(format!(
                    "design {} returned {} objectives and {} constraints, expected {} and {}",
                    i,
                    y.len(),
                    c.len(),
                    ydim,
                    cdim
                )
                .into());
            }
            objectives.extend(y);
            constraints.extend(c);
        }

        Ok(Evaluation::new(
            Array2::from_shape_vec((n, ydim), objectives)?,
            Array2::from_shape_vec((n, cdim), constraints)?,
        ))
    }
}

impl<F> std::fmt::Debug for RowEvaluator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowEvaluator")
            .field("parallel_threshold", &self.parallel_threshold)
            .finish_non_exhaustive()
    }
}

/// Skips designs that fail a feasibility predicate.
///
/// Rejected designs are never handed to the inner evaluator; every objective and
/// constraint of such a design is set to a fixed fill value. The remaining
/// designs are forwarded to the inner evaluator in a single call.
///
/// # Example
///
/// ```rust
/// use ndarray::{array, ArrayView1, ArrayView2};
/// use paretoga::evaluation::{Evaluation, Evaluator, FnEvaluator, GuardedEvaluator};
///
/// // The model is only defined for a < R (column 0 is R, column 1 is a)
/// let model = FnEvaluator::new(|x: ArrayView2<'_, f64>| {
///     Ok(Evaluation::unconstrained(x.slice(ndarray::s![.., 0..1]).to_owned()))
/// });
/// let guarded = GuardedEvaluator::new(model, |x: ArrayView1<'_, f64>| x[1] < x[0], 1, 0);
///
/// let result = guarded.evaluate(array![[1.2, 1.0], [1.0, 1.1]].view()).unwrap();
/// assert_eq!(result.objectives, array![[1.2], [10.0]]);
/// ```
#[derive(Clone)]
pub struct GuardedEvaluator<E, P> {
    inner: E,
    is_feasible: P,
    ydim: usize,
    cdim: usize,
    fill: f64,
}

impl<E, P> GuardedEvaluator<E, P>
where
    E: Evaluator,
    P: Fn(ArrayView1<'_, f64>) -> bool,
{
    pub fn new(inner: E, is_feasible: P, ydim: usize, cdim: usize) -> Self {
        Self {
            inner,
            is_feasible,
            ydim,
            cdim,
            fill: DEFAULT_INFEASIBLE_FILL,
        }
    }

    /// Sets the value given to rejected designs.
    pub fn with_fill(mut self, fill: f64) -> Self {
        self.fill = fill;
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E, P> Evaluator for GuardedEvaluator<E, P>
where
    E: Evaluator,
    P: Fn(ArrayView1<'_, f64>) -> bool,
{
    fn evaluate(&self, designs: ArrayView2<'_, f64>) -> Result<Evaluation, BoxError> {
        let n = designs.nrows();
        let accepted: Vec<usize> = (0..n)
            .filter(|&i| (self.is_feasible)(designs.row(i)))
            .collect();

        let mut objectives = Array2::from_elem((n, self.ydim), self.fill);
        let mut constraints = Array2::from_elem((n, self.cdim), self.fill);

        if n > accepted.len() {
            debug!(
                rejected = n - accepted.len(),
                "designs failed the feasibility guard"
            );
        }

        if accepted.is_empty() {
            return Ok(Evaluation::new(objectives, constraints));
        }

        let subset = designs.select(Axis(0), &accepted);
        let inner = self.inner.evaluate(subset.view())?;
        if inner.objectives.dim() != (accepted.len(), self.ydim)
            || inner.constraints.dim() != (accepted.len(), self.cdim)
        {
            return Err(format!(
                "inner evaluator returned objectives {:?} and constraints {:?} for {} designs",
                inner.objectives.dim(),
                inner.constraints.dim(),
                accepted.len()
            )
            .into());
        }

        for (k, &i) in accepted.iter().enumerate() {
            objectives.row_mut(i).assign(&inner.objectives.row(k));
            constraints.row_mut(i).assign(&inner.constraints.row(k));
        }

        Ok(Evaluation::new(objectives, constraints))
    }
}

impl<E: std::fmt::Debug, P> std::fmt::Debug for GuardedEvaluator<E, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedEvaluator")
            .field("inner", &self.inner)
            .field("ydim", &self.ydim)
            .field("cdim", &self.cdim)
            .field("fill", &self.fill)
            .finish_non_exhaustive()
    }
}

/// Optimization direction of a single objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        }
    }
}

/// Negates maximized objectives so the optimizer can minimize everything.
///
/// Objective bounds of a maximized objective must be given in negated form,
/// e.g. a lift target in `[0, 2]` becomes `(-2, 0)`.
#[derive(Debug, Clone)]
pub struct DirectedEvaluator<E> {
    inner: E,
    directions: Vec<Direction>,
}

impl<E: Evaluator> DirectedEvaluator<E> {
    pub fn new(inner: E, directions: Vec<Direction>) -> Self {
        Self { inner, directions }
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }
}

impl<E: Evaluator> Evaluator for DirectedEvaluator<E> {
    fn evaluate(&self, designs: ArrayView2<'_, f64>) -> Result<Evaluation, BoxError> {
        let mut evaluation = self.inner.evaluate(designs)?;
        if evaluation.objectives.ncols() != self.directions.len() {
            return Err(format!(
                "expected {} objectives, got {}",
                self.directions.len(),
                evaluation.objectives.ncols()
            )
            .into());
        }

        for (mut column, direction) in evaluation
            .objectives
            .axis_iter_mut(Axis(1))
            .zip(self.directions.iter())
        {
            let sign = direction.sign();
            column.mapv_inplace(|v| sign * v);
        }
        Ok(evaluation)
    }
}
