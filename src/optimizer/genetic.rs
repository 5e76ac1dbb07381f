//! # GA
//!
//! Differential-evolution genetic algorithm with an elite archive.
//!
//! Every generation the trial population is evaluated, stacked with the
//! archive, ranked on penalized normalized objectives and truncated back to
//! `npop` rows. The surviving archive then breeds the next trial population:
//! each slot takes three distinct other archive members `a`, `b`, `c`, forms the
//! mutant `clip(a + F * (b - c), 0, 1)` in normalized space and crosses it with
//! its own vector.
//!
//! ## Example
//!
//! ```rust
//! use ndarray::{ArrayView2, Axis};
//! use paretoga::evaluation::{Evaluation, FnEvaluator};
//! use paretoga::optimizer::{GaOptions, Problem, GA};
//! use paretoga::rng::RandomNumberGenerator;
//!
//! let sphere = FnEvaluator::new(|x: ArrayView2<'_, f64>| {
//!     let y = x.mapv(|v| v * v).sum_axis(Axis(1)).insert_axis(Axis(1));
//!     Ok(Evaluation::unconstrained(y))
//! });
//! let problem = Problem::new(&[(-5.0, 5.0), (-5.0, 5.0)], &[(0.0, 50.0)], &[]).unwrap();
//!
//! let mut ga = GA::builder()
//!     .with_evaluator(sphere)
//!     .with_problem(problem)
//!     .with_options(GaOptions::default())
//!     .with_rng(RandomNumberGenerator::from_seed(7))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(ga.iterate(10).unwrap(), 10);
//! assert_eq!(ga.archive().len(), 20);
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use ndarray::{concatenate, Array2, ArrayView2, Axis, Zip};
use tracing::{debug, info, warn};

use super::{
    archive::{Archive, EpsilonDominanceArchiver},
    core::{EvaluatedPopulation, OptimizerCore, Problem},
    options::GaOptions,
    Optimizer,
};
use crate::{
    error::{OptimizerError, Result, ResultExt},
    evaluation::Evaluator,
    pareto::{compute_ranks, sort_by_rank},
    penalty::penalized_objectives,
    rng::RandomNumberGenerator,
    store::ArchiveStore,
};

/// The differential-evolution optimizer.
pub struct GA<E> {
    core: OptimizerCore<E>,
    options: GaOptions,
    archiver: EpsilonDominanceArchiver,
    archive: Archive,
    rng: RandomNumberGenerator,
    cancelled: Arc<AtomicBool>,
}

impl<E: Evaluator> GA<E> {
    /// Creates an optimizer with an empty archive.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`GaOptions::validate`].
    pub fn new(
        evaluator: E,
        problem: Problem,
        options: GaOptions,
        rng: RandomNumberGenerator,
    ) -> Result<Self> {
        options.validate()?;
        let archiver = EpsilonDominanceArchiver::new(
            options.get_eps_dominance_bins(),
            options.get_bin_preference(),
        )?;
        let archive = Archive::empty(problem.xdim(), problem.ydim(), problem.cdim());
        let core = OptimizerCore::new(evaluator, problem, *options.get_penalty())?;

        Ok(Self {
            core,
            options,
            archiver,
            archive,
            rng,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn builder() -> GaBuilder<E> {
        GaBuilder::new()
    }

    /// Replaces the persistence collaborator.
    pub fn with_store(mut self, store: Box<dyn ArchiveStore + Send>) -> Self {
        self.core.set_store(store);
        self
    }

    pub fn options(&self) -> &GaOptions {
        &self.options
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn problem(&self) -> &Problem {
        self.core.problem()
    }

    pub fn current_iteration(&self) -> usize {
        self.core.current_iteration()
    }

    pub fn set_store(&mut self, store: Box<dyn ArchiveStore + Send>) {
        self.core.set_store(store);
    }

    /// Shared flag that stops [`GA::iterate`] before the next generation starts.
    ///
    /// The flag stays set until cleared by the caller.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn evaluate(&self, x: &ArrayView2<'_, f64>) -> Result<EvaluatedPopulation> {
        self.core.evaluate(x)
    }

    /// Runs up to `itermax` generations and returns how many completed.
    ///
    /// A fresh uniform trial population is drawn at the start of every call; the
    /// archive carries over. Fewer than `itermax` generations complete only when
    /// the cancellation flag is raised.
    ///
    /// # Errors
    ///
    /// Evaluation errors abort the current generation. The archive and the
    /// iteration counter keep the state of the last completed generation.
    pub fn iterate(&mut self, itermax: usize) -> Result<usize> {
        let npop = self.options.get_population_size();
        let unit = self.rng.uniform_matrix(npop, self.core.problem().xdim());
        let mut trial = self.core.problem().xbounds().to_physical(&unit.view())?;

        let mut completed = 0;
        while completed < itermax {
            if self.cancelled.load(Ordering::SeqCst) {
                warn!(
                    iteration = self.core.current_iteration(),
                    completed, itermax, "optimization cancelled"
                );
                break;
            }
            trial = self.generation(&trial)?;
            completed += 1;
        }
        Ok(completed)
    }

    /// Thins the archive to one member per occupied epsilon bin and returns the
    /// number of rows removed.
    pub fn eps_dominance(&mut self) -> Result<usize> {
        self.archiver
            .prune(&mut self.archive, self.core.problem().ybounds())
    }

    /// Indices of the archive members on the non-dominated front.
    pub fn pareto_front(&self) -> Result<Vec<usize>> {
        self.archive.pareto_front(self.core.problem().ybounds())
    }

    /// One full generation. Nothing is committed unless every step succeeds.
    fn generation(&mut self, trial: &Array2<f64>) -> Result<Array2<f64>> {
        let npop = self.options.get_population_size();
        let evaluated = self.core.evaluate(&trial.view())?;

        // Archive rows come first so incumbents win rank ties against trial rows
        let pool_x = concatenate(Axis(0), &[self.archive.x(), trial.view()])
            .context("Failed to stack the archive with trial designs")?;
        let pool_y = concatenate(Axis(0), &[self.archive.y(), evaluated.y.view()])
            .context("Failed to stack the archive with trial objectives")?;
        let pool_p = concatenate(Axis(0), &[self.archive.p(), evaluated.p.view()])
            .context("Failed to stack the archive with trial penalties")?;

        let y_norm = self
            .core
            .problem()
            .ybounds()
            .to_normalized(&pool_y.view())?;
        let criteria = penalized_objectives(&y_norm.view(), &pool_p.view());
        let ranks = compute_ranks(&criteria.view());

        let elite: Vec<usize> = sort_by_rank(&ranks).into_iter().take(npop).collect();
        let front_size = elite.iter().filter(|&&i| ranks[i] == 0).count();
        let archive = Archive::from_parts(pool_x, pool_y, pool_p)?.select(&elite);

        let offspring = self.reproduce(&archive)?;

        self.archive = archive;
        let iteration = self.core.advance();

        info!(
            iteration,
            archive_size = self.archive.len(),
            front_size,
            best = ?self.archive.best_objectives(),
            "generation complete"
        );
        debug!(
            iteration,
            mean = ?trial.mean_axis(Axis(0)),
            std = ?trial.std_axis(Axis(0), 0.0),
            infeasible = evaluated.infeasible_count(),
            "trial population"
        );

        let snapshot = self.archive.snapshot(iteration);
        self.core.notify_store(&snapshot);

        Ok(offspring)
    }

    /// Breeds one child per archive slot, in physical units.
    fn reproduce(&mut self, archive: &Archive) -> Result<Array2<f64>> {
        let xbounds = self.core.problem().xbounds();
        let parents = xbounds.to_normalized(&archive.x())?;
        let (n, xdim) = parents.dim();
        if n < 4 {
            return Err(OptimizerError::InsufficientPopulation(n));
        }

        let mutation = self.options.get_mutation();
        let crossp = self.options.get_crossover_probability();
        let mut children = parents.clone();

        for (j, mut child) in children.axis_iter_mut(Axis(0)).enumerate() {
            let donors = self.rng.distinct_excluding(n, 3, j);
            let (a, b, c) = (
                parents.row(donors[0]),
                parents.row(donors[1]),
                parents.row(donors[2]),
            );
            let mutant = Zip::from(&a)
                .and(&b)
                .and(&c)
                .map_collect(|&a, &b, &c| (a + mutation * (b - c)).clamp(0.0, 1.0));

            let mut mask: Vec<bool> = (0..xdim).map(|_| self.rng.unit() < crossp).collect();
            if !mask.contains(&true) {
                mask[self.rng.index(xdim)] = true;
            }

            for (k, take) in mask.into_iter().enumerate() {
                if take {
                    child[k] = mutant[k];
                }
            }
        }

        xbounds.to_physical(&children.view())
    }
}

impl<E: Evaluator> Optimizer for GA<E> {
    fn evaluate(&self, x: &ArrayView2<'_, f64>) -> Result<EvaluatedPopulation> {
        GA::evaluate(self, x)
    }

    fn iterate(&mut self, itermax: usize) -> Result<usize> {
        GA::iterate(self, itermax)
    }

    fn archive(&self) -> &Archive {
        &self.archive
    }

    fn problem(&self) -> &Problem {
        self.core.problem()
    }

    fn current_iteration(&self) -> usize {
        self.core.current_iteration()
    }

    fn set_store(&mut self, store: Box<dyn ArchiveStore + Send>) {
        self.core.set_store(store);
    }
}

impl<E> std::fmt::Debug for GA<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GA")
            .field("core", &self.core)
            .field("options", &self.options)
            .field("archive_size", &self.archive.len())
            .field("cancelled", &self.cancelled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Assembles a [`GA`] from its parts.
///
/// The evaluator and the problem are required. Options default to
/// [`GaOptions::default`], the random source to an entropy-seeded one and the
/// store to a no-op.
pub struct GaBuilder<E> {
    evaluator: Option<E>,
    problem: Option<Problem>,
    options: Option<GaOptions>,
    store: Option<Box<dyn ArchiveStore + Send>>,
    rng: Option<RandomNumberGenerator>,
}

impl<E: Evaluator> GaBuilder<E> {
    pub fn new() -> Self {
        Self {
            evaluator: None,
            problem: None,
            options: None,
            store: None,
            rng: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: E) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_problem(mut self, problem: Problem) -> Self {
        self.problem = Some(problem);
        self
    }

    pub fn with_options(mut self, options: GaOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_store(mut self, store: Box<dyn ArchiveStore + Send>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_rng(mut self, rng: RandomNumberGenerator) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(RandomNumberGenerator::from_seed(seed))
    }

    pub fn build(self) -> Result<GA<E>> {
        let evaluator = self
            .evaluator
            .ok_or_else(|| OptimizerError::Configuration("Evaluator not specified".to_string()))?;

        let problem = self
            .problem
            .ok_or_else(|| OptimizerError::Configuration("Problem not specified".to_string()))?;

        let mut ga = GA::new(
            evaluator,
            problem,
            self.options.unwrap_or_default(),
            self.rng.unwrap_or_default(),
        )?;
        if let Some(store) = self.store {
            ga.set_store(store);
        }
        Ok(ga)
    }
}

impl<E: Evaluator> Default for GaBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
