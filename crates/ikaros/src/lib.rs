//! # ikaros
//!
//! Rolling risk models and portfolio construction.
//!
//! This crate provides a unified interface to the ikaros crates. Individual
//! components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core type definitions
//! - `traits`: Data provider, signal and transform abstractions
//! - `math`: Linear algebra and statistics
//! - `model`: Rolling factor model, shrinkage covariance and regressions
//! - `portfolio`: Mean-variance, Black-Litterman and signal portfolios
//! - `utils`: CSV and Polars data utilities
//! - `cli`: The `ikaros` command-line tool
//!
//! ## Example
//!
//! ```rust,ignore
//! // With default features (all components):
//! use ikaros::model::RollingFactorModel;
//! use ikaros::portfolio::MeanVariancePortfolio;
//!
//! // Or with specific features only:
//! // [dependencies]
//! // ikaros = { version = "0.1", default-features = false, features = ["model"] }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/ikaros-quant/ikaros/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use ikaros_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use ikaros_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use ikaros_math as math;
#[cfg(feature = "model")]
#[doc(inline)]
pub use ikaros_model as model;
#[cfg(feature = "portfolio")]
#[doc(inline)]
pub use ikaros_portfolio as portfolio;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use ikaros_utils as utils;
