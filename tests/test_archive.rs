use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ndarray::{ArrayView2, Axis};
use paretoga::{
    error::{BoundsKind, BoxError, OptimizerError},
    evaluation::{Evaluation, FnEvaluator},
    optimizer::{BinPreference, EpsilonDominanceArchiver, GaOptions, Problem, GA},
    rng::RandomNumberGenerator,
    store::{FnStore, GenerationSnapshot, MemoryStore},
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn two_objectives(x: ArrayView2<'_, f64>) -> Result<Evaluation, BoxError> {
    let f1 = x.column(0).mapv(|v| v * v);
    let f2 = x.column(0).mapv(|v| (v - 2.0) * (v - 2.0));
    Ok(Evaluation::unconstrained(ndarray::stack(
        Axis(1),
        &[f1.view(), f2.view()],
    )?))
}

fn two_objective_problem() -> Problem {
    Problem::new(&[(-3.0, 3.0)], &[(0.0, 25.0), (0.0, 25.0)], &[]).unwrap()
}

fn assert_unique_bins(ga: &GA<impl paretoga::evaluation::Evaluator>, bins: usize) {
    let archiver = EpsilonDominanceArchiver::new(bins, BinPreference::default()).unwrap();
    let ybounds = ga.problem().ybounds();
    let mut keys = HashSet::new();
    for row in ga.archive().y().axis_iter(Axis(0)) {
        let normalized = ybounds.normalize_row(&row).unwrap();
        assert!(keys.insert(archiver.bin_key(&normalized.view())));
    }
    assert_eq!(keys.len(), ga.archive().len());
}

#[test]
fn test_eps_dominance_leaves_one_member_per_bin() {
    init_tracing();
    for preference in [BinPreference::FartherFromEdge, BinPreference::CloserToEdge] {
        let options = GaOptions::builder()
            .eps_dominance_bins(10)
            .bin_preference(preference)
            .build();
        let mut ga = GA::new(
            FnEvaluator::new(two_objectives),
            two_objective_problem(),
            options,
            RandomNumberGenerator::from_seed(12),
        )
        .unwrap();
        ga.iterate(20).unwrap();

        let before = ga.archive().len();
        let removed = ga.eps_dominance().unwrap();

        assert_eq!(before - removed, ga.archive().len());
        assert_eq!(ga.archive().x().nrows(), ga.archive().p().nrows());
        assert_unique_bins(&ga, 10);

        // A second pass finds nothing left to remove
        assert_eq!(ga.eps_dominance().unwrap(), 0);
    }
}

#[test]
fn test_iterate_after_pruning_refills_archive() {
    init_tracing();
    let mut ga = GA::new(
        FnEvaluator::new(two_objectives),
        two_objective_problem(),
        GaOptions::builder().eps_dominance_bins(3).build(),
        RandomNumberGenerator::from_seed(77),
    )
    .unwrap();
    ga.iterate(10).unwrap();
    ga.eps_dominance().unwrap();
    assert!(ga.archive().len() < 20);

    ga.iterate(5).unwrap();
    assert_eq!(ga.archive().len(), 20);
    assert_eq!(ga.current_iteration(), 15);
}

#[test]
fn test_evaluation_failure_keeps_last_committed_archive() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let flaky = FnEvaluator::new(move |x: ArrayView2<'_, f64>| {
        if counter.fetch_add(1, Ordering::SeqCst) == 2 {
            return Err("flow solver diverged".into());
        }
        two_objectives(x)
    });
    let store = MemoryStore::new();

    let mut ga = GA::new(
        flaky,
        two_objective_problem(),
        GaOptions::default(),
        RandomNumberGenerator::from_seed(5),
    )
    .unwrap()
    .with_store(Box::new(store.clone()));

    match ga.iterate(5) {
        Err(OptimizerError::Evaluation { generation, source }) => {
            assert_eq!(generation, 3);
            assert_eq!(source.to_string(), "flow solver diverged");
        }
        other => panic!("Expected Evaluation error, got {:?}", other),
    }

    assert_eq!(ga.current_iteration(), 2);
    let latest = store.latest().unwrap();
    assert_eq!(latest.iteration, 2);
    assert_eq!(ga.archive().snapshot(2), latest);

    // The run can resume once the evaluator recovers
    assert_eq!(ga.iterate(2).unwrap(), 2);
    assert_eq!(ga.current_iteration(), 4);
}

#[test]
fn test_non_finite_objectives_abort_generation() {
    init_tracing();
    let broken = FnEvaluator::new(|x: ArrayView2<'_, f64>| {
        Ok(Evaluation::unconstrained(
            x.sum_axis(Axis(1)).insert_axis(Axis(1)).mapv(|v| v / 0.0),
        ))
    });
    let problem = Problem::new(&[(1.0, 2.0)], &[(0.0, 1.0)], &[]).unwrap();
    let mut ga = GA::new(
        broken,
        problem,
        GaOptions::default(),
        RandomNumberGenerator::from_seed(0),
    )
    .unwrap();

    assert!(matches!(
        ga.iterate(3),
        Err(OptimizerError::InvalidNumericValue(_))
    ));
    assert!(ga.archive().is_empty());
    assert_eq!(ga.current_iteration(), 0);
}

#[test]
fn test_cancellation_between_generations() {
    init_tracing();
    let mut ga = GA::new(
        FnEvaluator::new(two_objectives),
        two_objective_problem(),
        GaOptions::default(),
        RandomNumberGenerator::from_seed(21),
    )
    .unwrap();

    let flag = ga.cancellation_flag();
    let trigger = Arc::clone(&flag);
    ga.set_store(Box::new(FnStore::new(
        move |snapshot: &GenerationSnapshot| -> Result<(), BoxError> {
            if snapshot.iteration == 3 {
                trigger.store(true, Ordering::SeqCst);
            }
            Ok(())
        },
    )));

    assert_eq!(ga.iterate(10).unwrap(), 3);
    assert_eq!(ga.current_iteration(), 3);
    assert_eq!(ga.archive().len(), 20);

    flag.store(false, Ordering::SeqCst);
    assert_eq!(ga.iterate(2).unwrap(), 2);
    assert_eq!(ga.current_iteration(), 5);
}

#[test]
fn test_invalid_construction() {
    match Problem::new(&[(0.0, 1.0), (3.0, 3.0)], &[(0.0, 1.0)], &[]) {
        Err(OptimizerError::InvalidBounds {
            kind, dimension, ..
        }) => {
            assert_eq!(kind, BoundsKind::Design);
            assert_eq!(dimension, 1);
        }
        other => panic!("Expected InvalidBounds, got {:?}", other),
    }

    let result = GA::new(
        FnEvaluator::new(two_objectives),
        two_objective_problem(),
        GaOptions::new(3, 6, 0.5, 0.7),
        RandomNumberGenerator::from_seed(0),
    );
    assert!(matches!(
        result,
        Err(OptimizerError::InsufficientPopulation(3))
    ));

    let result = GA::new(
        FnEvaluator::new(two_objectives),
        two_objective_problem(),
        GaOptions::new(10, 1, 0.5, 0.7),
        RandomNumberGenerator::from_seed(0),
    );
    assert!(matches!(result, Err(OptimizerError::Configuration(_))));
}

#[test]
fn test_store_errors_do_not_stop_the_run() {
    init_tracing();
    let mut ga = GA::new(
        FnEvaluator::new(two_objectives),
        two_objective_problem(),
        GaOptions::default(),
        RandomNumberGenerator::from_seed(3),
    )
    .unwrap()
    .with_store(Box::new(FnStore::new(
        |_snapshot: &GenerationSnapshot| -> Result<(), BoxError> {
            Err("disk full".into())
        },
    )));

    assert_eq!(ga.iterate(3).unwrap(), 3);
    assert_eq!(ga.current_iteration(), 3);
}
