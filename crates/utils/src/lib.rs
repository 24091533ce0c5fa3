//! # ikaros-utils
//!
//! Glue between ikaros and tabular data:
//!
//! - wide CSV tables (`date` plus one column per instrument) to panels and
//!   series, and result containers back to Polars `DataFrame`s
//! - an in-memory market data and benchmark provider
//! - point-in-time mapping of release-dated fundamentals onto trading dates

#![doc(issue_tracker_base_url = "https://github.com/ikaros-quant/ikaros/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod frame;
pub use frame::{
    DATE_COLUMN, benchmark_from_frame, covariance_to_frame, dates_from_column, frame_to_panel,
    frame_to_series, series_to_frame, vectors_to_frame,
};

mod csv;
pub use csv::{read_csv, write_csv};

mod point_in_time;
pub use point_in_time::point_in_time;

mod provider;
pub use provider::InMemoryProvider;

mod error;
pub use error::UtilsError;
