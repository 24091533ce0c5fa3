//! # ikaros-primitives
//!
//! Core type definitions shared by every ikaros crate: instrument identifiers,
//! date-indexed series and return matrices, covariance matrices, factor model
//! results, portfolio weights and the per-date rolling estimate container.

#![doc(issue_tracker_base_url = "https://github.com/ikaros-quant/ikaros/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod instrument;
pub use instrument::{InstrumentId, instrument_ids};

mod series;
pub use series::{DateIndexed, DatedSeries, TimeSeries, validate_dates};

mod returns;
pub use returns::ReturnMatrix;

mod covariance;
pub use covariance::{CovarianceMatrix, CovarianceSeries};

mod factor;
pub use factor::FactorModelResult;

mod weights;
pub use weights::{PortfolioWeights, ViewSpecification};

mod rolling;
pub use rolling::RollingEstimate;

mod error;
pub use error::PrimitivesError;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
