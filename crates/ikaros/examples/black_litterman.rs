//! Example: Black-Litterman and pair trading through a data provider.
//!
//! Loads simulated prices and quarterly fundamentals into an in-memory
//! provider, blends market-implied returns with a value view and a momentum
//! view, and runs a pair trade on two of the instruments.
//!
//! Run with: `cargo run --example black_litterman --features full`

use ikaros::{
    model::CovarianceConfig,
    portfolio::{
        BlackLitterman, BlackLittermanConfig, PairTrading, PairTradingConfig, TrailingZScore,
    },
    primitives::{Date, InstrumentId, TimeSeries, instrument_ids},
    traits::{FieldRatio, Instrument, PriceField, Signal, SignalError, TransformedSignal},
    utils::InMemoryProvider,
};
use ndarray::{Array1, array};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

const DAYS: usize = 400;
const QUARTER: usize = 63;
const TICKERS: [&str; 6] = ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let instruments = instrument_ids(TICKERS);
    let provider = simulate(&instruments)?;

    let value = FieldRatio::new("TotalRevenue", "PriceClose");
    let momentum = TransformedSignal::new(close_signal, TrailingZScore::new(21));
    let signals: [&dyn Signal; 2] = [&value, &momentum];

    let config = BlackLittermanConfig {
        covariance: CovarianceConfig { window: 126, ..CovarianceConfig::default() },
        risk_aversion: 2.5,
        tau: 0.05,
        ..BlackLittermanConfig::default()
    };
    let model = BlackLitterman::new(config)?;
    let output = model.run_with_provider(&instruments, &provider, &signals, &array![0.02, 0.01])?;

    let weights = output.weights.weights();
    println!("Black-Litterman weights on {} dates", weights.len());
    if let Some((date, w)) = weights.last() {
        let implied = output.implied_returns.get(date);
        println!("\n{date}");
        println!("{:<6} {:>10} {:>10}", "Ticker", "Implied", "Weight");
        for (j, id) in instruments.iter().enumerate() {
            let pi = implied.map_or(f64::NAN, |pi| pi[j]);
            println!("{:<6} {:>10.5} {:>10.4}", id.as_str(), pi, w.weights()[j]);
        }
    }

    let pair = PairTrading::new(PairTradingConfig::default())?;
    let (a, b) = (InstrumentId::new("AAA"), InstrumentId::new("BBB"));
    let (first, second) = (Instrument::new(&a, &provider), Instrument::new(&b, &provider));
    let legs = pair.run(&first, &second, &close_signal)?;
    let realized = PairTrading::realized_returns(&legs, &first, &second)?;
    println!(
        "\nPair AAA/BBB: {} weight dates, cumulative return {:.4}",
        legs.first.len(),
        realized.values().sum()
    );
    Ok(())
}

fn close_signal(instrument: &Instrument<'_>) -> Result<TimeSeries, SignalError> {
    Ok(instrument.close()?)
}

fn simulate(instruments: &[InstrumentId]) -> Result<InMemoryProvider, Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(11);
    let shock = Normal::new(0.0003, 0.015)?;
    let revenue_growth = Normal::new(0.02, 0.05)?;
    let dates: Vec<Date> = Date::from_ymd_opt(2023, 1, 2)
        .ok_or("invalid start date")?
        .iter_days()
        .take(DAYS)
        .collect();
    let release_dates: Vec<Date> = dates.iter().step_by(QUARTER).copied().collect();

    let mut provider = InMemoryProvider::new();
    for (j, id) in instruments.iter().enumerate() {
        let mut price = 20.0 + 10.0 * j as f64;
        let closes: Array1<f64> = (0..DAYS)
            .map(|_| {
                price *= 1.0 + shock.sample(&mut rng);
                price
            })
            .collect();
        provider = provider.with_prices(
            id.clone(),
            PriceField::Close,
            TimeSeries::new(dates.clone(), closes)?,
        );

        let mut revenue = 1_000.0 * (j + 1) as f64;
        let revenues: Array1<f64> = release_dates
            .iter()
            .map(|_| {
                revenue *= 1.0 + revenue_growth.sample(&mut rng);
                revenue
            })
            .collect();
        let shares = Array1::from_elem(release_dates.len(), 1e6 / (j + 1) as f64);
        provider = provider
            .with_releases(
                id.clone(),
                "TotalRevenue",
                &TimeSeries::new(release_dates.clone(), revenues)?,
            )?
            .with_releases(
                id.clone(),
                "ShareIssued",
                &TimeSeries::new(release_dates.clone(), shares)?,
            )?;
    }
    Ok(provider)
}
