//! Baseline removal applied to each frame before combination.

use std::path::{Path, PathBuf};

use ndarray::{Axis, Zip};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::console::Console;
use crate::consts::{MAX_PEDESTAL, PIXEL_MAX};
use crate::error::{DarkMakerError, Result};
use crate::frame::{Frame, FrameDescriptor};
use crate::io::FrameStore;

/// How to precalibrate input frames.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CalibrationSpec {
    #[default]
    None,
    /// Subtract a constant from every pixel.
    Pedestal { amount: u16 },
    /// Subtract one reference frame.
    FixedFile { path: PathBuf },
    /// Subtract the best-matching frame found in a directory.
    AutoDirectory { path: PathBuf },
}

impl CalibrationSpec {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Pedestal { amount } if *amount > MAX_PEDESTAL => Err(
                DarkMakerError::InvalidConfig(format!("pedestal {amount} exceeds {MAX_PEDESTAL}")),
            ),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for CalibrationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Pedestal { amount } => write!(f, "Pedestal {amount}"),
            Self::FixedFile { path } => write!(f, "File {}", path.display()),
            Self::AutoDirectory { path } => write!(f, "Best match in {}", path.display()),
        }
    }
}

/// A calibration spec resolved for one group: the concrete subtrahend.
#[derive(Clone, Debug)]
pub enum Calibration {
    None,
    Pedestal(f32),
    Reference(Frame),
}

/// Resolve `spec` for a group whose frames look like `sample`.
///
/// Reads at most one reference frame from the store.
pub fn resolve(
    spec: &CalibrationSpec,
    sample: &FrameDescriptor,
    store: &dyn FrameStore,
    console: &dyn Console,
) -> Result<Calibration> {
    match spec {
        CalibrationSpec::None => Ok(Calibration::None),
        CalibrationSpec::Pedestal { amount } => Ok(Calibration::Pedestal(*amount as f32)),
        CalibrationSpec::FixedFile { path } => load_reference(store, path),
        CalibrationSpec::AutoDirectory { path } => {
            let best = select_auto_calibration(store, path, sample, console)?;
            load_reference(store, best.path())
        }
    }
}

fn load_reference(store: &dyn FrameStore, path: &Path) -> Result<Calibration> {
    debug!(path = %path.display(), "Loading calibration frame");
    store.read_frame(path).map(Calibration::Reference)
}

/// Pick the calibration frame in `dir` that best matches `sample`.
///
/// Candidates must match width, height and binning exactly; among them the
/// one with the closest temperature wins, earliest in listing order on ties.
pub fn select_auto_calibration(
    store: &dyn FrameStore,
    dir: &Path,
    sample: &FrameDescriptor,
    console: &dyn Console,
) -> Result<FrameDescriptor> {
    if !dir.is_dir() {
        return Err(DarkMakerError::NoAutoCalibrationDirectory(dir.to_path_buf()));
    }

    let candidates: Vec<FrameDescriptor> = store
        .list_frames(dir)?
        .iter()
        .filter_map(|path| match store.read_descriptor(path) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable calibration candidate");
                None
            }
        })
        .collect();
    if candidates.is_empty() {
        return Err(DarkMakerError::AutoCalibrationDirectoryEmpty(dir.to_path_buf()));
    }

    let target = sample.temperature();
    let best = candidates
        .into_iter()
        .filter(|c| c.size_key() == sample.size_key())
        .fold(None::<FrameDescriptor>, |best, candidate| match best {
            Some(b) if (b.temperature() - target).abs() <= (candidate.temperature() - target).abs() => {
                Some(b)
            }
            _ => Some(candidate),
        })
        .ok_or(DarkMakerError::NoSuitableAutoBias)?;

    console.message(
        &format!(
            "Selected calibration file {} at {} degrees",
            best.name(),
            best.temperature()
        ),
        2,
        true,
    );
    Ok(best)
}

/// Apply a resolved calibration to every frame of the stack.
///
/// Results are limited to [0, 65535]. A reference frame must share the
/// stack's width and height, and have either one layer or as many layers
/// as the frames; anything else is `IncompatibleSizes`.
pub fn apply(frames: Vec<Frame>, calibration: &Calibration) -> Result<Vec<Frame>> {
    match calibration {
        Calibration::None => Ok(frames),
        Calibration::Pedestal(pedestal) => Ok(frames
            .into_iter()
            .map(|mut frame| {
                frame
                    .data
                    .mapv_inplace(|v| (v - pedestal).clamp(0.0, PIXEL_MAX));
                frame
            })
            .collect()),
        Calibration::Reference(reference) => {
            for frame in &frames {
                let same_plane =
                    frame.width() == reference.width() && frame.height() == reference.height();
                let layers_fit = reference.layers() == 1 || reference.layers() == frame.layers();
                if !same_plane || !layers_fit {
                    return Err(DarkMakerError::IncompatibleSizes);
                }
            }
            Ok(frames
                .into_iter()
                .map(|mut frame| {
                    for layer in 0..frame.layers() {
                        let ref_layer = if reference.layers() == 1 { 0 } else { layer };
                        let subtrahend = reference.data.index_axis(Axis(0), ref_layer);
                        let mut plane = frame.data.index_axis_mut(Axis(0), layer);
                        Zip::from(&mut plane)
                            .and(&subtrahend)
                            .for_each(|v, &r| *v = (*v - r).clamp(0.0, PIXEL_MAX));
                    }
                    frame
                })
                .collect())
        }
    }
}

/// Resolve `spec` and apply it in one step.
pub fn calibrate(
    frames: Vec<Frame>,
    spec: &CalibrationSpec,
    sample: &FrameDescriptor,
    store: &dyn FrameStore,
    console: &dyn Console,
) -> Result<Vec<Frame>> {
    let calibration = resolve(spec, sample, store, console)?;
    apply(frames, &calibration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn pedestal_clamps_at_zero() {
        let frame = Frame::from_plane(array![[5.0f32, 10.0], [50.0, 65535.0]]);
        let out = apply(vec![frame], &Calibration::Pedestal(10.0)).unwrap();
        let expected = Array3::from_shape_vec((1, 2, 2), vec![0.0, 0.0, 40.0, 65525.0]).unwrap();
        assert_eq!(out[0].data, expected);
    }

    #[test]
    fn reference_size_mismatch_is_rejected() {
        let frame = Frame::new(Array3::zeros((1, 4, 4)));
        let reference = Frame::new(Array3::zeros((1, 4, 5)));
        let err = apply(vec![frame], &Calibration::Reference(reference)).unwrap_err();
        assert!(matches!(err, DarkMakerError::IncompatibleSizes));
    }

    #[test]
    fn single_layer_reference_applies_to_every_layer() {
        let frame = Frame::new(Array3::from_elem((3, 2, 2), 100.0f32));
        let reference = Frame::from_plane(array![[10.0f32, 20.0], [30.0, 200.0]]);
        let out = apply(vec![frame], &Calibration::Reference(reference)).unwrap();
        for layer in 0..3 {
            assert_eq!(out[0].data[[layer, 0, 0]], 90.0);
            assert_eq!(out[0].data[[layer, 0, 1]], 80.0);
            assert_eq!(out[0].data[[layer, 1, 0]], 70.0);
            assert_eq!(out[0].data[[layer, 1, 1]], 0.0);
        }
    }

    #[test]
    fn pedestal_above_limit_is_invalid() {
        assert!(CalibrationSpec::Pedestal { amount: 32_767 }.validate().is_ok());
        assert!(CalibrationSpec::Pedestal { amount: 32_768 }.validate().is_err());
    }
}
