//! # ikaros-portfolio
//!
//! Turns rolling risk estimates and signals into per-date portfolio weights:
//!
//! - closed-form long/short mean-variance optimizer at a fixed target variance
//! - Black-Litterman blending of lagged market-implied returns with
//!   rank-based signal views
//! - market-capitalization weights, including the long/short bucket
//!   normalization
//! - rank portfolios and pair trading driven by opaque signal functions
//!
//! Weights are always applied one period late against realized returns.

#![doc(issue_tracker_base_url = "https://github.com/ikaros-quant/ikaros/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod weight_series;
pub use weight_series::WeightSeries;

mod mean_variance;
pub use mean_variance::{MeanVarianceConfig, MeanVariancePortfolio, optimize};

mod market;
pub use market::{MarketWeighting, market_weights, normalize_long_short};

mod signals;
pub use signals::{
    SignalPanel, TrailingZScore, close_panel, market_cap_panel, panel_from_series, signal_panel,
};

mod black_litterman;
pub use black_litterman::{
    BlackLitterman, BlackLittermanConfig, BlackLittermanOutput, implied_returns, link_matrix,
    posterior_weights, view_specification,
};

mod strategies;
pub use strategies::{
    PairTrading, PairTradingConfig, PairWeights, RankPortfolio, RelativeMeasure, rank_weights,
};

mod error;
pub use error::PortfolioError;

/// Re-export commonly used types.
pub mod prelude {
    pub use super::{
        BlackLitterman, BlackLittermanConfig, MeanVarianceConfig, MeanVariancePortfolio,
        PairTrading, PortfolioError, RankPortfolio, WeightSeries,
    };
}
