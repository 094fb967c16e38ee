use crate::error::Result;
use crate::frame::Frame;

use super::reduce_per_pixel;

/// Stack frames by computing the median at each pixel position.
///
/// Even-length stacks average the two central values. Uses
/// `select_nth_unstable` for O(n) selection without a full sort.
pub fn median_stack(frames: &[Frame]) -> Result<Frame> {
    reduce_per_pixel(frames, compute_median)
}

pub(crate) fn compute_median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        let upper = values[mid];
        let lower = *values[..mid]
            .select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b))
            .1;
        (lower + upper) / 2.0
    }
}
