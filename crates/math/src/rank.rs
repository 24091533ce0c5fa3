//! Cross-sectional rank transform.

use ndarray::{Array1, ArrayView1};

/// Map one cross-section of scores onto `[-1, 1]` by rank.
///
/// Scores are ranked ascending with ties sharing their average rank, then
/// rescaled as `2 * (rank - 1) / (count - 1) - 1`, where `count` is the number
/// of finite scores. Non-finite scores, and every score of a cross-section
/// with fewer than two finite values, map to 0.
#[must_use]
pub fn rank_to_unit_interval(scores: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut order: Vec<usize> = (0..scores.len()).filter(|&i| scores[i].is_finite()).collect();
    let count = order.len();
    let mut out = Array1::zeros(scores.len());
    if count < 2 {
        return out;
    }
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let scale = 2.0 / (count - 1) as f64;
    let mut start = 0;
    while start < count {
        let mut end = start + 1;
        while end < count && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Zero-based average rank of the tie group [start, end).
        let rank = (start + end - 1) as f64 / 2.0;
        for &i in &order[start..end] {
            out[i] = scale * rank - 1.0;
        }
        start = end;
    }
    out
}
