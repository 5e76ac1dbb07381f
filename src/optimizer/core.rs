//! # Optimizer core
//!
//! `Problem` holds the physical bounds of designs, objectives and constraints.
//! `OptimizerCore` is the state every optimizer shares: it calls the evaluator,
//! checks what comes back, turns constraint violations into penalties, counts
//! committed generations and hands each committed archive to the store.

use ndarray::{Array2, ArrayView2};
use tracing::warn;

use crate::{
    bounds::Bounds,
    error::{BoundsKind, OptimizerError, Result},
    evaluation::Evaluator,
    penalty::PenaltyPolicy,
    store::{ArchiveStore, GenerationSnapshot, NoopStore},
};

/// Problem definition: physical bounds of the designs, the objectives and the
/// constraints.
///
/// Design bounds define the search space. Objective bounds non-dimensionalize
/// objectives for ranking. Constraint bounds define feasibility.
///
/// ```rust
/// use paretoga::optimizer::Problem;
///
/// let problem = Problem::new(&[(-5.0, 5.0), (-5.0, 5.0)], &[(0.0, 50.0)], &[]).unwrap();
/// assert_eq!((problem.xdim(), problem.ydim(), problem.cdim()), (2, 1, 0));
///
/// assert!(Problem::new(&[(1.0, 1.0)], &[(0.0, 1.0)], &[]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Problem {
    xbounds: Bounds,
    ybounds: Bounds,
    cbounds: Bounds,
}

impl Problem {
    pub fn new(
        xbounds: &[(f64, f64)],
        ybounds: &[(f64, f64)],
        cbounds: &[(f64, f64)],
    ) -> Result<Self> {
        if xbounds.is_empty() {
            return Err(OptimizerError::Configuration(
                "At least one design variable is required".to_string(),
            ));
        }
        if ybounds.is_empty() {
            return Err(OptimizerError::Configuration(
                "At least one objective is required".to_string(),
            ));
        }

        Ok(Self {
            xbounds: Bounds::new(BoundsKind::Design, xbounds)?,
            ybounds: Bounds::new(BoundsKind::Objective, ybounds)?,
            cbounds: Bounds::new(BoundsKind::Constraint, cbounds)?,
        })
    }

    pub fn xbounds(&self) -> &Bounds {
        &self.xbounds
    }

    pub fn ybounds(&self) -> &Bounds {
        &self.ybounds
    }

    pub fn cbounds(&self) -> &Bounds {
        &self.cbounds
    }

    pub fn xdim(&self) -> usize {
        self.xbounds.dim()
    }

    pub fn ydim(&self) -> usize {
        self.ybounds.dim()
    }

    pub fn cdim(&self) -> usize {
        self.cbounds.dim()
    }
}

/// Result of evaluating a trial population: raw objectives `y`, raw constraint
/// values `c` and penalties `p`, row-aligned with the designs.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedPopulation {
    pub y: Array2<f64>,
    pub c: Array2<f64>,
    pub p: Array2<f64>,
}

impl EvaluatedPopulation {
    /// Number of designs with at least one violated constraint.
    pub fn infeasible_count(&self) -> usize {
        self.p
            .rows()
            .into_iter()
            .filter(|row| row.iter().any(|&v| v > 0.0))
            .count()
    }
}

/// State shared by every optimizer: the evaluator, the problem definition, the
/// penalty policy, the iteration counter and the persistence hook.
pub struct OptimizerCore<E> {
    evaluator: E,
    problem: Problem,
    penalty: PenaltyPolicy,
    current_iteration: usize,
    store: Box<dyn ArchiveStore + Send>,
}

impl<E: Evaluator> OptimizerCore<E> {
    pub fn new(evaluator: E, problem: Problem, penalty: PenaltyPolicy) -> Result<Self> {
        penalty.validate()?;
        Ok(Self {
            evaluator,
            problem,
            penalty,
            current_iteration: 0,
            store: Box::new(NoopStore),
        })
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn penalty(&self) -> &PenaltyPolicy {
        &self.penalty
    }

    /// Number of completed generations.
    pub fn current_iteration(&self) -> usize {
        self.current_iteration
    }

    pub fn set_store(&mut self, store: Box<dyn ArchiveStore + Send>) {
        self.store = store;
    }

    /// Evaluates a physical design matrix and converts constraint violations into
    /// penalties.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::ShapeMismatch`] if `x` does not have `xdim` columns or the
    ///   evaluator returns matrices of the wrong shape
    /// - [`OptimizerError::Evaluation`] if the evaluator fails
    /// - [`OptimizerError::InvalidNumericValue`] if the evaluator returns NaN or infinity
    pub fn evaluate(&self, x: &ArrayView2<'_, f64>) -> Result<EvaluatedPopulation> {
        let n = x.nrows();
        if x.ncols() != self.problem.xdim() {
            return Err(OptimizerError::ShapeMismatch(format!(
                "expected designs with {} variables, got {}",
                self.problem.xdim(),
                x.ncols()
            )));
        }

        let generation = self.current_iteration + 1;
        let evaluation = self
            .evaluator
            .evaluate(x.view())
            .map_err(|source| OptimizerError::Evaluation { generation, source })?;

        let (y, c) = (evaluation.objectives, evaluation.constraints);
        if y.dim() != (n, self.problem.ydim()) {
            return Err(OptimizerError::ShapeMismatch(format!(
                "expected objectives of shape {:?}, got {:?}",
                (n, self.problem.ydim()),
                y.dim()
            )));
        }
        if c.dim() != (n, self.problem.cdim()) {
            return Err(OptimizerError::ShapeMismatch(format!(
                "expected constraints of shape {:?}, got {:?}",
                (n, self.problem.cdim()),
                c.dim()
            )));
        }
        if let Some(v) = y.iter().chain(c.iter()).find(|v| !v.is_finite()) {
            return Err(OptimizerError::InvalidNumericValue(format!(
                "evaluator returned {} in generation {}",
                v, generation
            )));
        }

        let p = self.penalty.penalties(&c.view(), &self.problem.cbounds)?;
        Ok(EvaluatedPopulation { y, c, p })
    }

    /// Marks a generation as committed and returns the new iteration number.
    pub(crate) fn advance(&mut self) -> usize {
        self.current_iteration += 1;
        self.current_iteration
    }

    /// Hands a snapshot to the store; failures are logged and otherwise ignored.
    pub(crate) fn notify_store(&mut self, snapshot: &GenerationSnapshot) {
        if let Err(e) = self.store.store(snapshot) {
            warn!(
                iteration = snapshot.iteration,
                error = %e,
                "archive store failed"
            );
        }
    }
}

impl<E> std::fmt::Debug for OptimizerCore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerCore")
            .field("problem", &self.problem)
            .field("penalty", &self.penalty)
            .field("current_iteration", &self.current_iteration)
            .finish_non_exhaustive()
    }
}
