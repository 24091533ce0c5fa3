//! # ikaros-traits
//!
//! Seams between the numerical core and its collaborators: market and benchmark
//! data providers, the instrument handle used to look up fields, opaque signal
//! functions and time-series transforms.

#![doc(issue_tracker_base_url = "https://github.com/ikaros-quant/ikaros/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod provider;
pub use provider::{
    BenchmarkProvider, BenchmarkSeries, Instrument, MarketDataProvider, PriceField, ProviderError,
};

mod signal;
pub use signal::{FieldRatio, Signal, SignalError, TransformedSignal};

mod transform;
pub use transform::{SeriesTransform, TransformError};
