//! End-to-end factor model scenario on fabricated data.
#![allow(missing_docs)]

use approx::assert_abs_diff_eq;
use ikaros_model::{FactorModelConfig, ModelError, RollingFactorModel, align};
use ikaros_primitives::{Date, ReturnMatrix, TimeSeries, instrument_ids};
use ikaros_traits::BenchmarkSeries;
use ndarray::{Array1, Array2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

const DAYS: usize = 300;
const BETAS: [f64; 3] = [1.0, 1.5, 0.5];

fn calendar(len: usize) -> Vec<Date> {
    Date::from_ymd_opt(2020, 1, 1).unwrap().iter_days().take(len).collect()
}

fn perfectly_correlated() -> (ReturnMatrix, BenchmarkSeries) {
    let mut rng = StdRng::seed_from_u64(2024);
    let market = Normal::new(0.0004, 0.012).unwrap();
    let dates = calendar(DAYS);
    let total: Array1<f64> = (0..DAYS).map(|_| market.sample(&mut rng)).collect();
    let rf: Array1<f64> = (0..DAYS).map(|t| 0.00008 + 0.000001 * (t % 5) as f64).collect();
    let excess = &total - &rf;

    let values = Array2::from_shape_fn((DAYS, 3), |(t, j)| BETAS[j] * excess[t]);
    let returns =
        ReturnMatrix::new(dates.clone(), instrument_ids(["LOW", "MID", "HIGH"]), values).unwrap();
    let benchmark = BenchmarkSeries {
        excess: TimeSeries::new(dates.clone(), excess).unwrap(),
        total: TimeSeries::new(dates.clone(), total).unwrap(),
        risk_free: TimeSeries::new(dates, rf).unwrap(),
    };
    (returns, benchmark)
}

#[test]
fn recovers_betas_with_zero_idiosyncratic_risk() {
    let (returns, benchmark) = perfectly_correlated();
    let model = RollingFactorModel::new(FactorModelConfig::default()).unwrap();
    let output = model.estimate(&returns, &benchmark).unwrap();

    let estimates = output.estimates();
    assert!(estimates.is_complete());
    assert_eq!(estimates.len(), DAYS - 126);

    for (_, result) in estimates.values() {
        for (j, beta) in BETAS.iter().enumerate() {
            assert_abs_diff_eq!(result.betas[j], *beta, epsilon = 1e-3);
        }
        for v in result.idiosyncratic.matrix() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-12);
        }
        assert!(result.decomposition_error() < 1e-12);
    }
    assert_eq!(output.instruments()[2].as_str(), "HIGH");
}

#[test]
fn misaligned_calendars_are_trimmed() {
    let (returns, benchmark) = perfectly_correlated();
    // Drop the benchmark's last 30 days: the model only sees the overlap.
    let keep = calendar(DAYS)[..DAYS - 30].to_vec();
    let mask = TimeSeries::new(keep.clone(), Array1::zeros(keep.len())).unwrap();
    let trimmed = align(&[benchmark.excess.clone(), mask]).unwrap().remove(0);
    let shorter = BenchmarkSeries { excess: trimmed, ..benchmark };

    let model = RollingFactorModel::new(FactorModelConfig::default()).unwrap();
    let output = model.estimate(&returns, &shorter).unwrap();
    assert_eq!(output.estimates().len(), DAYS - 30 - 126);
}

#[test]
fn disjoint_benchmark_is_fatal() {
    let (returns, benchmark) = perfectly_correlated();
    let later: Vec<Date> = Date::from_ymd_opt(2030, 1, 1).unwrap().iter_days().take(DAYS).collect();
    let shifted = BenchmarkSeries {
        excess: TimeSeries::new(later, benchmark.excess.values().clone()).unwrap(),
        ..benchmark
    };
    let model = RollingFactorModel::default();
    let err = model.estimate(&returns, &shifted).unwrap_err();
    assert_eq!(err, ModelError::EmptyIntersection);
}
