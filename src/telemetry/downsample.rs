/// Maximum number of points handed to the track map
pub const DEFAULT_TRACK_POINTS: usize = 200;

/// Decimation stride that keeps at most `target` out of `len` elements.
/// Rounds `len / target` up rather than down: a floored stride keeps every
/// element for `target < len < 2 * target` and overshoots the target.
pub fn stride(len: usize, target: usize) -> usize {
    len.div_ceil(target.max(1)).max(1)
}

/// Fixed-stride decimation used for visualization. Keeps every element whose
/// index is a multiple of the stride, so index 0 always survives and order is
/// preserved.
pub fn downsample<T: Clone>(items: &[T], target: usize) -> Vec<T> {
    let step = stride(items.len(), target);
    items.iter().step_by(step).cloned().collect()
}
