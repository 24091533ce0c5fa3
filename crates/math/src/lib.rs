//! # ikaros-math
//!
//! Numerical kernels shared by the rolling estimators and portfolio builders:
//!
//! - Gauss-Jordan matrix inversion and linear solves that never mutate their input
//! - closed-form ordinary least squares with optional intercept
//! - sample covariance and linear shrinkage toward the diagonal
//! - cross-sectional rank transform onto `[-1, 1]`
//! - window statistics, trailing z-scores and the standard normal CDF

#![doc(issue_tracker_base_url = "https://github.com/ikaros-quant/ikaros/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod linalg;
pub use linalg::{invert, invert_symmetric, solve};

mod ols;
pub use ols::{OlsResult, regress};

mod covariance;
pub use covariance::{sample_covariance, shrink_to_diagonal};

mod rank;
pub use rank::rank_to_unit_interval;

mod stats;
pub use stats::{mean, normal_cdf, sample_variance, trailing_zscore};

mod error;
pub use error::MathError;
