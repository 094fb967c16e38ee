use ndarray::{Array3, Zip};

use crate::error::Result;
use crate::frame::Frame;

use super::stack_shape;

/// Stack frames by computing the mean at each pixel.
///
/// Sums accumulate in `f64` so long stacks of 16-bit values lose nothing.
pub fn mean_stack(frames: &[Frame]) -> Result<Frame> {
    let shape = stack_shape(frames)?;
    let n = frames.len() as f64;

    let mut sum = Array3::<f64>::zeros(shape);
    for frame in frames {
        Zip::from(&mut sum)
            .and(&frame.data)
            .for_each(|s, &v| *s += v as f64);
    }

    Ok(Frame::new(sum.mapv(|s| (s / n) as f32)))
}
