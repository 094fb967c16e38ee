use crate::error::{DarkMakerError, Result};
use crate::frame::Frame;

use super::{mean_of, reduce_per_pixel};

/// Stack frames using a single-pass sigma-clipped mean.
///
/// Per pixel: compute the mean and population standard deviation, drop
/// values whose distance from the mean exceeds `threshold * stddev`, and
/// average the survivors. Identical values (stddev 0) are never clipped.
/// If every value would be dropped the unclipped mean is used instead.
pub fn sigma_clip_stack(frames: &[Frame], threshold: f64) -> Result<Frame> {
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(DarkMakerError::InvalidConfig(format!(
            "sigma threshold {threshold} must be a positive number"
        )));
    }
    reduce_per_pixel(frames, |values| sigma_clipped_mean(values, threshold))
}

pub(crate) fn sigma_clipped_mean(values: &[f64], threshold: f64) -> f64 {
    let (mean, stddev) = mean_stddev(values);
    if stddev == 0.0 {
        return mean;
    }

    let limit = threshold * stddev;
    let (sum, count) = values
        .iter()
        .filter(|&&v| (v - mean).abs() <= limit)
        .fold((0.0f64, 0usize), |(s, c), &v| (s + v, c + 1));

    if count > 0 {
        sum / count as f64
    } else {
        mean
    }
}

fn mean_stddev(values: &[f64]) -> (f64, f64) {
    let mean = mean_of(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}
