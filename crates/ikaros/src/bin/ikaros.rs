//! Ikaros CLI binary.
//!
//! Runs the rolling estimators and portfolio builders over CSV tables and
//! writes their per-date output back to CSV.
//!
//! ```sh
//! ikaros factor-model --prices prices.csv --benchmark benchmark.csv --output out/
//! ikaros covariance --prices prices.csv --shrinkage 0.8 --output out/
//! ikaros mean-variance --prices prices.csv --target-variance 0.35 --output out/
//! ikaros black-litterman --prices prices.csv --caps caps.csv \
//!     --view value.csv --view-return 0.02 --output out/
//! ikaros pair --prices prices.csv --first AAA --second BBB --output out/
//! ```
//!
//! Price, capitalization and signal tables are wide: a `date` column
//! (`YYYY-MM-DD`) and one column per instrument. The benchmark table has
//! `date`, `excess`, `total` and `risk_free` columns. `--config` reads a JSON
//! file with optional `factor_model`, `covariance`, `mean_variance`,
//! `black_litterman` and `pair` sections; command-line flags take precedence.
//! Set `RUST_LOG` to control log output.

use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use ikaros::{
    model::{CovarianceConfig, FactorModelConfig, RollingFactorModel, ShrinkageCovariance},
    portfolio::{
        BlackLitterman, BlackLittermanConfig, MeanVarianceConfig, MeanVariancePortfolio,
        PairTrading, PairTradingConfig, RankPortfolio, RelativeMeasure, WeightSeries,
    },
    primitives::{Date, InstrumentId, ReturnMatrix, TimeSeries},
    traits::{Instrument, SignalError},
    utils::{
        InMemoryProvider, benchmark_from_frame, covariance_to_frame, frame_to_panel, read_csv,
        series_to_frame, vectors_to_frame, write_csv,
    },
};
use ndarray::{Array1, ArrayView1};
use polars::prelude::DataFrame;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "ikaros")]
#[command(about = "Rolling risk models and portfolio construction", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file with estimator settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rolling window length, overriding every configured window
    #[arg(long, global = true)]
    window: Option<usize>,

    /// Directory for output tables
    #[arg(long, global = true, default_value = ".")]
    output: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rolling single-factor model: expected returns, betas and covariances
    FactorModel {
        /// Wide table of closing prices
        #[arg(long)]
        prices: PathBuf,

        /// Table with excess, total and risk_free benchmark returns
        #[arg(long)]
        benchmark: PathBuf,
    },

    /// Rolling shrinkage covariance
    Covariance {
        /// Wide table of closing prices
        #[arg(long)]
        prices: PathBuf,

        /// Weight on the sample covariance
        #[arg(long)]
        shrinkage: Option<f64>,
    },

    /// Closed-form mean-variance weights at a target variance
    MeanVariance {
        /// Wide table of closing prices
        #[arg(long)]
        prices: PathBuf,

        /// Annualized portfolio variance to target
        #[arg(long)]
        target_variance: Option<f64>,
    },

    /// Black-Litterman weights from market capitalizations and signal views
    BlackLitterman {
        /// Wide table of closing prices
        #[arg(long)]
        prices: PathBuf,

        /// Wide table of market capitalizations
        #[arg(long)]
        caps: PathBuf,

        /// Wide table of signal values, one per view
        #[arg(long = "view", required = true)]
        views: Vec<PathBuf>,

        /// Expected return of each view, in view order
        #[arg(long = "view-return", required = true, allow_negative_numbers = true)]
        view_returns: Vec<f64>,

        /// Risk-aversion scalar
        #[arg(long)]
        risk_aversion: Option<f64>,

        /// Uncertainty scaling
        #[arg(long)]
        tau: Option<f64>,
    },

    /// Long/short weights from the cross-sectional rank of a signal
    Rank {
        /// Wide table of closing prices
        #[arg(long)]
        prices: PathBuf,

        /// Wide table of signal values
        #[arg(long)]
        signal: PathBuf,
    },

    /// Pair trade on the relative closing price of two instruments
    Pair {
        /// Wide table of closing prices
        #[arg(long)]
        prices: PathBuf,

        /// First leg
        #[arg(long)]
        first: String,

        /// Second leg
        #[arg(long)]
        second: String,

        /// Use the price difference instead of the ratio
        #[arg(long)]
        difference: bool,

        /// Trade against the z-score instead of with it
        #[arg(long)]
        flip: bool,
    },
}

/// Estimator settings read from `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunConfig {
    factor_model: FactorModelConfig,
    covariance: CovarianceConfig,
    mean_variance: MeanVarianceConfig,
    black_litterman: BlackLittermanConfig,
    pair: PairTradingConfig,
}

impl RunConfig {
    fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    const fn with_window(mut self, window: Option<usize>) -> Self {
        if let Some(window) = window {
            self.factor_model.window = window;
            self.covariance.window = window;
            self.mean_variance.covariance.window = window;
            self.black_litterman.covariance.window = window;
            self.pair.window = window;
        }
        self
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = RunConfig::load(cli.config.as_deref())?.with_window(cli.window);
    fs::create_dir_all(&cli.output)?;
    let out = cli.output.as_path();

    match cli.command {
        Commands::FactorModel { prices, benchmark } => {
            let returns = load_returns(&prices)?;
            let benchmark = benchmark_from_frame(&read_csv(&benchmark)?)?;
            let model = RollingFactorModel::new(config.factor_model)?;
            let output = model.estimate(&returns, &benchmark)?;
            let instruments = output.instruments();

            let expected = output.expected_returns();
            let betas = output.betas();
            write(vectors_to_frame(instruments, rows(expected.iter()))?, out, "expected_returns")?;
            write(vectors_to_frame(instruments, rows(betas.iter()))?, out, "betas")?;
            write(covariance_to_frame(&output.covariance())?, out, "covariance")?;
            write(covariance_to_frame(&output.systematic())?, out, "systematic")?;
            write(covariance_to_frame(&output.idiosyncratic())?, out, "idiosyncratic")?;
            info!(
                estimated = output.estimates().len(),
                failed = output.estimates().failures().len(),
                "factor model written"
            );
        }
        Commands::Covariance { prices, shrinkage } => {
            let mut cov = config.covariance;
            if let Some(shrinkage) = shrinkage {
                cov.shrinkage = shrinkage;
            }
            let returns = load_returns(&prices)?;
            let series = ShrinkageCovariance::new(cov)?.estimate(&returns);
            write(covariance_to_frame(&series)?, out, "covariance")?;
        }
        Commands::MeanVariance { prices, target_variance } => {
            let mut mv = config.mean_variance;
            if let Some(target) = target_variance {
                mv.target_variance = target;
            }
            let returns = load_returns(&prices)?;
            let weights = MeanVariancePortfolio::new(mv)?.run(&returns)?;
            write_weights(&weights, &returns, out)?;
        }
        Commands::BlackLitterman { prices, caps, views, view_returns, risk_aversion, tau } => {
            let mut bl = config.black_litterman;
            if let Some(a) = risk_aversion {
                bl.risk_aversion = a;
            }
            if let Some(tau) = tau {
                bl.tau = tau;
            }
            let returns = load_returns(&prices)?;
            let caps = frame_to_panel(&read_csv(&caps)?)?;
            let views = views
                .iter()
                .map(|path| Ok(frame_to_panel(&read_csv(path)?)?))
                .collect::<CliResult<Vec<_>>>()?;
            let output = BlackLitterman::new(bl)?.run(
                &returns,
                &caps,
                &views,
                &Array1::from(view_returns),
            )?;
            let implied = &output.implied_returns;
            write(vectors_to_frame(&output.instruments, rows(implied.iter()))?, out, "implied")?;
            write_weights(&output.weights, &returns, out)?;
        }
        Commands::Rank { prices, signal } => {
            let returns = load_returns(&prices)?;
            let panel = frame_to_panel(&read_csv(&signal)?)?;
            let portfolio = RankPortfolio::from_panel(&panel);
            write_weights(portfolio.weights(), &returns, out)?;
        }
        Commands::Pair { prices, first, second, difference, flip } => {
            let mut pair = config.pair;
            pair.flip |= flip;
            if difference {
                pair.relative = RelativeMeasure::Difference;
            }
            let closes = frame_to_panel(&read_csv(&prices)?)?;
            let provider = InMemoryProvider::from_close_panel(&closes);
            let (first, second) = (InstrumentId::new(first), InstrumentId::new(second));
            let legs = (Instrument::new(&first, &provider), Instrument::new(&second, &provider));

            let weights = PairTrading::new(pair)?.run(&legs.0, &legs.1, &close_signal)?;
            let realized = PairTrading::realized_returns(&weights, &legs.0, &legs.1)?;
            let stacked: Vec<(Date, Array1<f64>)> = weights
                .first
                .iter()
                .zip(weights.second.values())
                .map(|((date, a), b)| (date, Array1::from(vec![a, *b])))
                .collect();
            let legs = [first, second];
            let pairs = stacked.iter().map(|(date, w)| (date, w));
            write(vectors_to_frame(&legs, rows(pairs))?, out, "weights")?;
            write(series_to_frame(&realized, "return")?, out, "returns")?;
        }
    }
    Ok(())
}

fn close_signal(instrument: &Instrument<'_>) -> Result<TimeSeries, SignalError> {
    Ok(instrument.close()?)
}

/// Simple returns from a wide table of closing prices.
fn load_returns(path: &Path) -> CliResult<ReturnMatrix> {
    let prices = frame_to_panel(&read_csv(path)?)?;
    Ok(ReturnMatrix::from_prices(
        prices.dates().to_vec(),
        prices.instruments().to_vec(),
        prices.values().clone(),
    )?)
}

fn rows<'a>(
    iter: impl Iterator<Item = (&'a Date, &'a Array1<f64>)>,
) -> impl Iterator<Item = (Date, ArrayView1<'a, f64>)> {
    iter.map(|(date, values)| (*date, values.view()))
}

fn write_weights(weights: &WeightSeries, returns: &ReturnMatrix, out: &Path) -> CliResult<()> {
    let vectors = weights.weights().iter().map(|(date, w)| (*date, w.weights().view()));
    write(vectors_to_frame(weights.instruments(), vectors)?, out, "weights")?;
    write(series_to_frame(&weights.lagged_returns(returns), "return")?, out, "returns")?;
    info!(
        dates = weights.weights().len(),
        failed = weights.estimates().failures().len(),
        "weights written"
    );
    Ok(())
}

fn write(mut df: DataFrame, dir: &Path, name: &str) -> CliResult<()> {
    write_csv(&mut df, dir.join(format!("{name}.csv")))?;
    Ok(())
}
