//! Market-capitalization weights.

use std::collections::BTreeMap;

use ikaros_primitives::{DatedSeries, PortfolioWeights, ReturnMatrix};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cut-off separating the long bucket from the rest in [`normalize_long_short`].
const BUCKET_THRESHOLD: f64 = 0.001;

/// How market capitalizations become weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketWeighting {
    /// Positive caps over their total; everything else gets zero. Undefined
    /// when no cap is positive.
    #[default]
    LongOnly,
    /// The two-bucket rule of [`normalize_long_short`].
    LongShortNormalized,
}

/// Normalize a cross-section into a long and a short bucket.
///
/// Entries above `0.001` are divided by their sum. Then, on the updated
/// values, entries below `0.001` are divided by minus their sum. Small
/// positive values left by the first step therefore land in the second
/// bucket. A bucket summing to zero yields non-finite weights.
#[must_use]
pub fn normalize_long_short(values: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut x = values.to_owned();

    let long: f64 = x.iter().filter(|&&v| v > BUCKET_THRESHOLD).sum();
    x.mapv_inplace(|v| if v > BUCKET_THRESHOLD { v / long } else { v });

    let short: f64 = x.iter().filter(|&&v| v < BUCKET_THRESHOLD).sum();
    x.mapv_inplace(|v| if v < BUCKET_THRESHOLD { v / -short } else { v });
    x
}

fn long_only(values: ArrayView1<'_, f64>) -> Array1<f64> {
    let total: f64 = values.iter().filter(|&&v| v > 0.0).sum();
    if total <= 0.0 {
        return Array1::from_elem(values.len(), f64::NAN);
    }
    values.mapv(|v| if v > 0.0 { v / total } else { 0.0 })
}

/// Per-date market weights from a capitalization panel.
///
/// Dates where any capitalization is missing, or where the weighting yields a
/// non-finite weight, are left out.
#[must_use]
pub fn market_weights(
    caps: &ReturnMatrix,
    weighting: MarketWeighting,
) -> DatedSeries<PortfolioWeights> {
    let mut out = BTreeMap::new();
    for (t, date) in caps.dates().iter().enumerate() {
        let row = caps.values().row(t);
        if row.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let weights = match weighting {
            MarketWeighting::LongOnly => long_only(row),
            MarketWeighting::LongShortNormalized => normalize_long_short(row),
        };
        if weights.iter().all(|w| w.is_finite()) {
            out.insert(*date, PortfolioWeights::new(weights));
        } else {
            debug!(%date, "market weights undefined");
        }
    }
    out.into()
}
