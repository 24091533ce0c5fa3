//! # ikaros-model
//!
//! Rolling estimators over a sliding window of aligned return observations:
//!
//! - date alignment across any set of date-indexed containers
//! - the single-factor (market) model: betas, idiosyncratic variances, expected
//!   returns and the systematic / idiosyncratic covariance decomposition
//! - shrinkage covariance series and their inverses
//! - rolling multi-regressor OLS and trailing mean returns
//!
//! Every window is estimated independently and in parallel. A window that fails
//! numerically is recorded against its date in a `RollingEstimate` and never
//! aborts the run.

#![doc(issue_tracker_base_url = "https://github.com/ikaros-quant/ikaros/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod align;
pub use align::{align, common_dates};

mod rolling;

mod factor_model;
pub use factor_model::{FactorModelConfig, FactorModelOutput, RollingFactorModel};

mod covariance;
pub use covariance::{
    CovarianceConfig, PrecisionSeries, ShrinkageCovariance, invert_series, rolling_covariance,
};

mod regression;
pub use regression::{RollingRegression, rolling_regression};

mod expected;
pub use expected::trailing_mean_returns;

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use super::{
        CovarianceConfig, FactorModelConfig, ModelError, RollingFactorModel, ShrinkageCovariance,
    };
}
