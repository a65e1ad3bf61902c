use itertools::{Itertools, MinMaxResult};

use super::{Sample, value_or_zero};

/// Value every point takes when a series has no spatial variance
const FLAT_SERIES_PCT: f64 = 50.;

/// Min-max rescale of a series into `[0, 100]`.
pub fn normalize_percent(values: &[f64]) -> Vec<f64> {
    let (min, max) = match values.iter().copied().minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => return Vec::new(),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let range = max - min;
    if range > 0. {
        values.iter().map(|v| (v - min) / range * 100.).collect()
    } else {
        vec![FLAT_SERIES_PCT; values.len()]
    }
}

/// Percent-space positions of every sample, computed over the whole sequence.
/// The second axis is `y` when the recording has it and `z` otherwise.
pub fn problem_positions(samples: &[Sample]) -> Vec<(f64, f64)> {
    let xs = samples.iter().map(|s| value_or_zero(s.x)).collect_vec();
    let has_y = samples.iter().any(|s| s.y.is_some());
    let ys = samples
        .iter()
        .map(|s| value_or_zero(if has_y { s.y } else { s.z }))
        .collect_vec();
    normalize_percent(&xs)
        .into_iter()
        .zip(normalize_percent(&ys))
        .collect()
}
