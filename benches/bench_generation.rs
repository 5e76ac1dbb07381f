use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{ArrayView1, ArrayView2, Axis};

use paretoga::{
    evaluation::{Evaluation, FnEvaluator, RowEvaluator},
    optimizer::{GaOptions, Problem, GA},
    rng::RandomNumberGenerator,
};

fn zdt1(x: ArrayView1<'_, f64>) -> (f64, f64) {
    let f1 = x[0];
    let tail = x.iter().skip(1).sum::<f64>() / (x.len() - 1) as f64;
    let g = 1.0 + 9.0 * tail;
    (f1, g * (1.0 - (f1 / g).sqrt()))
}

fn bench_generations(c: &mut Criterion) {
    let problem = Problem::new(&[(0.0, 1.0); 10], &[(0.0, 1.0), (0.0, 10.0)], &[]).unwrap();

    let mut group = c.benchmark_group("ga_generations");
    group.sample_size(20);
    for npop in [20, 100, 400].iter() {
        group.bench_with_input(BenchmarkId::new("matrix_evaluator", npop), npop, |b, &npop| {
            b.iter(|| {
                let evaluator = FnEvaluator::new(|x: ArrayView2<'_, f64>| {
                    let rows: Vec<f64> = x
                        .axis_iter(Axis(0))
                        .flat_map(|row| {
                            let (f1, f2) = zdt1(row);
                            [f1, f2]
                        })
                        .collect();
                    Ok(Evaluation::unconstrained(ndarray::Array2::from_shape_vec(
                        (x.nrows(), 2),
                        rows,
                    )?))
                });
                let options = GaOptions::builder().population_size(npop).build();
                let mut ga = GA::new(
                    evaluator,
                    problem.clone(),
                    options,
                    RandomNumberGenerator::from_seed(1),
                )
                .unwrap();
                ga.iterate(10).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("row_evaluator", npop), npop, |b, &npop| {
            b.iter(|| {
                let evaluator = RowEvaluator::new(|x: ArrayView1<'_, f64>| {
                    let (f1, f2) = zdt1(x);
                    Ok((vec![f1, f2], vec![]))
                })
                .with_parallel_threshold(100);
                let options = GaOptions::builder().population_size(npop).build();
                let mut ga = GA::new(
                    evaluator,
                    problem.clone(),
                    options,
                    RandomNumberGenerator::from_seed(1),
                )
                .unwrap();
                ga.iterate(10).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generations);
criterion_main!(benches);
