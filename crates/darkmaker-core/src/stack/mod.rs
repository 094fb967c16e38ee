//! Per-pixel reduction of a stack of equally sized frames.
//!
//! Every method reduces each (layer, row, column) position independently.
//! Results are not clamped to the sensor range; only the container writer
//! limits values when encoding. An empty stack or a min/max clip with too
//! few frames is a caller bug, reported as an error rather than a panic.

pub mod mean;
pub mod median;
pub mod min_max;
pub mod sigma_clip;

use ndarray::Array3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::{PARALLEL_PIXEL_THRESHOLD, SIGMA_CLIP_MIN_FILES};
use crate::error::{DarkMakerError, Result};
use crate::frame::Frame;

/// Combination algorithm and its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CombineMethod {
    Mean,
    Median,
    /// Drop the `drop_per_end` lowest and highest values, mean the rest.
    MinMaxClip { drop_per_end: usize },
    /// Exclude values further than `threshold` standard deviations from
    /// the mean, mean the rest.
    SigmaClip { threshold: f64 },
}

impl Default for CombineMethod {
    fn default() -> Self {
        Self::SigmaClip {
            threshold: crate::consts::DEFAULT_SIGMA_THRESHOLD,
        }
    }
}

impl std::fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mean => write!(f, "Mean"),
            Self::Median => write!(f, "Median"),
            Self::MinMaxClip { drop_per_end } => write!(f, "Min/Max Clip (drop {drop_per_end})"),
            Self::SigmaClip { threshold } => write!(f, "Sigma Clip (threshold {threshold})"),
        }
    }
}

impl CombineMethod {
    /// Text recorded in the master frame's header.
    pub fn description(&self) -> String {
        match self {
            Self::Mean => "Master Dark MEAN combined".to_string(),
            Self::Median => "Master Dark MEDIAN combined".to_string(),
            Self::MinMaxClip { drop_per_end } => {
                format!("Master Dark Min/Max Clipped (drop {drop_per_end}) Mean combined")
            }
            Self::SigmaClip { threshold } => {
                format!("Master Dark Sigma Clipped (threshold {threshold}) Mean combined")
            }
        }
    }

    /// Short tag used in generated file names.
    pub fn file_tag(&self) -> String {
        match self {
            Self::Mean => "mean".to_string(),
            Self::Median => "median".to_string(),
            Self::MinMaxClip { drop_per_end } => format!("minmax{drop_per_end}"),
            Self::SigmaClip { threshold } => format!("sigma{threshold}"),
        }
    }

    /// Fewest frames this method can combine.
    pub fn min_files(&self) -> usize {
        match self {
            Self::Mean | Self::Median => 1,
            Self::MinMaxClip { drop_per_end } => 2 * drop_per_end + 1,
            Self::SigmaClip { .. } => SIGMA_CLIP_MIN_FILES,
        }
    }

    /// Reject parameter values no stack could satisfy.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::SigmaClip { threshold } if !(threshold.is_finite() && *threshold > 0.0) => {
                Err(DarkMakerError::InvalidConfig(format!(
                    "sigma threshold {threshold} must be a positive number"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Check that `count` frames are enough for this method.
    pub fn check_file_count(&self, count: usize) -> Result<()> {
        let required = self.min_files();
        if count < required {
            return Err(DarkMakerError::NotEnoughFiles {
                method: self.to_string(),
                required,
                found: count,
            });
        }
        Ok(())
    }
}

/// Combine a stack of frames into one with the given method.
pub fn combine(frames: &[Frame], method: &CombineMethod) -> Result<Frame> {
    match method {
        CombineMethod::Mean => mean::mean_stack(frames),
        CombineMethod::Median => median::median_stack(frames),
        CombineMethod::MinMaxClip { drop_per_end } => {
            min_max::min_max_clip_stack(frames, *drop_per_end)
        }
        CombineMethod::SigmaClip { threshold } => sigma_clip::sigma_clip_stack(frames, *threshold),
    }
}

/// Shape shared by every frame in the stack.
pub(crate) fn stack_shape(frames: &[Frame]) -> Result<(usize, usize, usize)> {
    let first = frames.first().ok_or(DarkMakerError::EmptySequence)?;
    let shape = first.data.dim();
    if frames.iter().any(|f| f.data.dim() != shape) {
        return Err(DarkMakerError::IncompatibleSizes);
    }
    Ok(shape)
}

/// Apply `reduce` to the values at every pixel position across the stack.
///
/// `reduce` receives a scratch slice it may reorder. Rows are processed in
/// parallel for large frames.
pub(crate) fn reduce_per_pixel<F>(frames: &[Frame], reduce: F) -> Result<Frame>
where
    F: Fn(&mut [f64]) -> f64 + Sync,
{
    let (layers, h, w) = stack_shape(frames)?;
    let n = frames.len();
    let mut result = Array3::<f32>::zeros((layers, h, w));

    for layer in 0..layers {
        if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
            // Row-parallel: each row allocates its own scratch buffer
            let rows: Vec<Vec<f32>> = (0..h)
                .into_par_iter()
                .map(|row| {
                    let mut values = vec![0.0f64; n];
                    let mut row_result = vec![0.0f32; w];
                    for (col, out) in row_result.iter_mut().enumerate() {
                        for (v, frame) in values.iter_mut().zip(frames) {
                            *v = frame.data[[layer, row, col]] as f64;
                        }
                        *out = reduce(&mut values) as f32;
                    }
                    row_result
                })
                .collect();

            for (row, row_data) in rows.into_iter().enumerate() {
                for (col, val) in row_data.into_iter().enumerate() {
                    result[[layer, row, col]] = val;
                }
            }
        } else {
            let mut values = vec![0.0f64; n];
            for row in 0..h {
                for col in 0..w {
                    for (v, frame) in values.iter_mut().zip(frames) {
                        *v = frame.data[[layer, row, col]] as f64;
                    }
                    result[[layer, row, col]] = reduce(&mut values) as f32;
                }
            }
        }
    }

    Ok(Frame::new(result))
}

pub(crate) fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
