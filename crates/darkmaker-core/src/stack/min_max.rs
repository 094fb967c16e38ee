use crate::error::{DarkMakerError, Result};
use crate::frame::Frame;

use super::{mean_of, reduce_per_pixel};

/// Per pixel: sort, drop `drop_per_end` values from each end, mean the rest.
///
/// With `drop_per_end == 0` this is the plain mean. The stack must hold
/// more than `2 * drop_per_end` frames.
pub fn min_max_clip_stack(frames: &[Frame], drop_per_end: usize) -> Result<Frame> {
    if frames.len() <= 2 * drop_per_end {
        return Err(DarkMakerError::NotEnoughFiles {
            method: format!("Min/Max Clip (drop {drop_per_end})"),
            required: 2 * drop_per_end + 1,
            found: frames.len(),
        });
    }

    reduce_per_pixel(frames, |values| {
        values.sort_unstable_by(|a, b| a.total_cmp(b));
        mean_of(&values[drop_per_end..values.len() - drop_per_end])
    })
}
