//! Benchmarks for ikaros-math kernels.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ikaros_math::{
    invert, rank_to_unit_interval, regress, sample_covariance, shrink_to_diagonal, trailing_zscore,
};
use ndarray::{Array1, Array2};
use rand::Rng;

fn random_array(n: usize) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    Array1::from_iter((0..n).map(|_| rng.r#gen::<f64>() * 0.1 - 0.05))
}

fn random_returns(rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |_| rng.r#gen::<f64>() * 0.04 - 0.02)
}

fn bench_invert(c: &mut Criterion) {
    let mut group = c.benchmark_group("invert");

    for n in [5, 20, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let cov = sample_covariance(random_returns(2 * n + 10, n).view()).unwrap();
            b.iter(|| invert(black_box(&cov)).unwrap());
        });
    }

    group.finish();
}

fn bench_sample_covariance(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_covariance");

    for (window, n) in [(126, 10), (126, 50), (252, 100)] {
        group.throughput(Throughput::Elements((window * n) as u64));
        group.bench_with_input(
            BenchmarkId::new("window_instruments", format!("{window}x{n}")),
            &(window, n),
            |b, &(window, n)| {
                let data = random_returns(window, n);
                b.iter(|| {
                    let cov = sample_covariance(black_box(data.view())).unwrap();
                    shrink_to_diagonal(&cov, 0.8).unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_regress(c: &mut Criterion) {
    let mut group = c.benchmark_group("regress");

    for (n_obs, n_regressors) in [(42, 1), (126, 1), (126, 5), (504, 10)] {
        group.throughput(Throughput::Elements((n_obs * n_regressors) as u64));
        group.bench_with_input(
            BenchmarkId::new("obs_regressors", format!("{n_obs}x{n_regressors}")),
            &(n_obs, n_regressors),
            |b, &(n_obs, n_regressors)| {
                let y = random_array(n_obs);
                let x = random_returns(n_obs, n_regressors);
                b.iter(|| regress(black_box(x.view()), black_box(y.view()), true).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_to_unit_interval");

    for size in [10, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_array(size);
            b.iter(|| rank_to_unit_interval(black_box(data.view())));
        });
    }

    group.finish();
}

fn bench_trailing_zscore(c: &mut Criterion) {
    let mut group = c.benchmark_group("trailing_zscore");

    for (len, window) in [(1000, 21), (5000, 90)] {
        group.bench_with_input(
            BenchmarkId::new("len_window", format!("{len}_{window}")),
            &(len, window),
            |b, &(len, window)| {
                let data = random_array(len);
                b.iter(|| trailing_zscore(black_box(data.view()), window).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_invert,
    bench_sample_covariance,
    bench_regress,
    bench_rank,
    bench_trailing_zscore,
);

criterion_main!(benches);
