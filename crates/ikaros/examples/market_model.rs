//! Example: rolling market model and mean-variance weights.
//!
//! Simulates a benchmark and five instruments with known betas, estimates the
//! rolling single-factor model, then sizes a mean-variance portfolio from the
//! factor-model covariance on the last estimated date.
//!
//! Run with: `cargo run --example market_model --features full`

use ikaros::{
    model::{FactorModelConfig, RollingFactorModel},
    portfolio::{MeanVariancePortfolio, optimize},
    primitives::{Date, ReturnMatrix, TimeSeries, instrument_ids},
    traits::BenchmarkSeries,
};
use ndarray::{Array1, Array2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

const DAYS: usize = 500;
const BETAS: [f64; 5] = [0.6, 0.9, 1.0, 1.2, 1.6];
const TICKERS: [&str; 5] = ["UTIL", "STPL", "INDU", "TECH", "SEMI"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (returns, benchmark) = simulate();
    println!(
        "Simulated {} days for {} instruments\n",
        returns.n_dates(),
        returns.n_instruments()
    );

    let model = RollingFactorModel::new(FactorModelConfig::default())?;
    let output = model.estimate(&returns, &benchmark)?;
    let estimates = output.estimates();
    println!("Estimated {} windows ({} failed)", estimates.len(), estimates.failures().len());

    let Some((date, last)) = estimates.values().last() else {
        return Err("no window could be estimated".into());
    };
    println!("\nMarket model at {date}");
    println!("{:<8} {:>8} {:>8} {:>12} {:>12}", "Ticker", "True", "Beta", "E[r]", "Idio var");
    for (j, id) in output.instruments().iter().enumerate() {
        println!(
            "{:<8} {:>8.2} {:>8.3} {:>12.4} {:>12.6}",
            id.as_str(),
            BETAS[j],
            last.betas[j],
            last.expected_returns[j],
            last.idiosyncratic_variances[j]
        );
    }
    println!("Decomposition error: {:.2e}", last.decomposition_error());

    let weights = optimize(&last.expected_returns, last.covariance.matrix(), 0.1, None)?;
    println!("\nMean-variance weights from the factor covariance (target variance 0.10)");
    for (id, w) in output.instruments().iter().zip(weights.iter()) {
        println!("{:<8} {:>8.4}", id.as_str(), w);
    }
    println!("Net exposure: {:.2e}", weights.sum());

    let portfolio = MeanVariancePortfolio::default().run(&returns)?;
    let realized = portfolio.lagged_returns(&returns);
    let mean = realized.values().mean().unwrap_or(f64::NAN);
    println!(
        "\nRolling sample-covariance portfolio: {} rebalances, mean daily return {:.5}",
        portfolio.weights().len(),
        mean
    );
    Ok(())
}

fn simulate() -> (ReturnMatrix, BenchmarkSeries) {
    let mut rng = StdRng::seed_from_u64(7);
    let market = Normal::new(0.0004, 0.011).expect("valid market distribution");
    let noise = Normal::new(0.0, 0.008).expect("valid noise distribution");

    let dates: Vec<Date> = Date::from_ymd_opt(2022, 1, 3)
        .expect("valid start date")
        .iter_days()
        .take(DAYS)
        .collect();
    let total: Array1<f64> = (0..DAYS).map(|_| market.sample(&mut rng)).collect();
    let risk_free = Array1::from_elem(DAYS, 0.0001);
    let excess = &total - &risk_free;

    let values = Array2::from_shape_fn((DAYS, BETAS.len()), |(t, j)| {
        risk_free[t] + 0.0001 * j as f64 + BETAS[j] * excess[t] + noise.sample(&mut rng)
    });
    let returns = ReturnMatrix::new(dates.clone(), instrument_ids(TICKERS), values)
        .expect("well-formed return matrix");
    let series = |values: Array1<f64>| {
        TimeSeries::new(dates.clone(), values).expect("one value per date")
    };
    let benchmark = BenchmarkSeries {
        excess: series(excess),
        total: series(total),
        risk_free: series(risk_free),
    };
    (returns, benchmark)
}
