//! Partitioning of frame descriptors into combinable groups.
//!
//! Grouping runs as nested stages: exact size/binning, then exposure within
//! a tolerance, then temperature within a tolerance. A disabled stage passes
//! its input through as a single group. Empty input yields no groups at
//! every stage.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_EXPOSURE_TOLERANCE, DEFAULT_TEMPERATURE_TOLERANCE};
use crate::error::{DarkMakerError, Result};
use crate::frame::FrameDescriptor;

/// Fractional tolerance in `[0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(fraction: f64) -> Result<Self> {
        if (0.0..1.0).contains(&fraction) {
            Ok(Self(fraction))
        } else {
            Err(DarkMakerError::InvalidConfig(format!(
                "tolerance {fraction} must be in [0, 1)"
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Tolerance {
    type Error = DarkMakerError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Tolerance> for f64 {
    fn from(t: Tolerance) -> f64 {
        t.0
    }
}

impl std::fmt::Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    pub by_size: bool,
    pub by_exposure: bool,
    pub by_temperature: bool,
    pub exposure_tolerance: Tolerance,
    pub temperature_tolerance: Tolerance,
}

impl GroupingConfig {
    /// True if any grouping stage is enabled.
    pub fn is_grouped(&self) -> bool {
        self.by_size || self.by_exposure || self.by_temperature
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            by_size: false,
            by_exposure: false,
            by_temperature: false,
            exposure_tolerance: Tolerance(DEFAULT_EXPOSURE_TOLERANCE),
            temperature_tolerance: Tolerance(DEFAULT_TEMPERATURE_TOLERANCE),
        }
    }
}

/// Whether two values agree within a fractional tolerance.
///
/// The difference is measured relative to `first` unless it is zero, in
/// which case `second` is the base; two zeros always agree. The base is
/// taken as an absolute value so negative temperatures compare by
/// magnitude; a signed `|a - b| / a` would let every negative pair agree.
pub fn values_same_within_tolerance(first: f64, second: f64, tolerance: f64) -> bool {
    let difference = (first - second).abs();
    let relative = if first != 0.0 {
        difference / first.abs()
    } else if second != 0.0 {
        difference / second.abs()
    } else {
        return true;
    };
    relative <= tolerance
}

/// Split by exact (width, height, binning). Groups come out in key order.
pub fn groups_by_size(frames: Vec<FrameDescriptor>, enabled: bool) -> Vec<Vec<FrameDescriptor>> {
    if frames.is_empty() {
        return Vec::new();
    }
    if !enabled {
        return vec![frames];
    }

    let mut sorted = frames;
    sorted.sort_by_key(FrameDescriptor::size_key);

    let mut groups: Vec<Vec<FrameDescriptor>> = Vec::new();
    for frame in sorted {
        match groups.last_mut() {
            Some(group) if group[0].size_key() == frame.size_key() => group.push(frame),
            _ => groups.push(vec![frame]),
        }
    }
    groups
}

/// Split by exposure within `tolerance`.
pub fn groups_by_exposure(
    frames: Vec<FrameDescriptor>,
    enabled: bool,
    tolerance: Tolerance,
) -> Vec<Vec<FrameDescriptor>> {
    groups_by_tolerance(frames, enabled, tolerance, FrameDescriptor::exposure)
}

/// Split by sensor temperature within `tolerance`.
pub fn groups_by_temperature(
    frames: Vec<FrameDescriptor>,
    enabled: bool,
    tolerance: Tolerance,
) -> Vec<Vec<FrameDescriptor>> {
    groups_by_tolerance(frames, enabled, tolerance, FrameDescriptor::temperature)
}

/// Sort ascending by `value`, then scan once. A run is compared against its
/// first member, not the previous one, so a slow drift cannot chain
/// dissimilar frames together.
fn groups_by_tolerance(
    frames: Vec<FrameDescriptor>,
    enabled: bool,
    tolerance: Tolerance,
    value: fn(&FrameDescriptor) -> f64,
) -> Vec<Vec<FrameDescriptor>> {
    if frames.is_empty() {
        return Vec::new();
    }
    if !enabled {
        return vec![frames];
    }

    let mut sorted = frames;
    sorted.sort_by(|a, b| value(a).total_cmp(&value(b)));

    let mut groups: Vec<Vec<FrameDescriptor>> = Vec::new();
    for frame in sorted {
        match groups.last_mut() {
            Some(group)
                if values_same_within_tolerance(
                    value(&group[0]),
                    value(&frame),
                    tolerance.value(),
                ) =>
            {
                group.push(frame)
            }
            _ => groups.push(vec![frame]),
        }
    }
    groups
}

/// Run all three stages, nested size → exposure → temperature.
///
/// Every input descriptor lands in exactly one output group.
pub fn group_frames(frames: Vec<FrameDescriptor>, config: &GroupingConfig) -> Vec<Vec<FrameDescriptor>> {
    groups_by_size(frames, config.by_size)
        .into_iter()
        .flat_map(|size_group| {
            groups_by_exposure(size_group, config.by_exposure, config.exposure_tolerance)
        })
        .flat_map(|exposure_group| {
            groups_by_temperature(
                exposure_group,
                config.by_temperature,
                config.temperature_tolerance,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_uses_first_value_as_base() {
        // |10 - 10.5| / 10 = 0.05
        assert!(values_same_within_tolerance(10.0, 10.5, 0.05));
        // 1 / 10 = 0.1
        assert!(!values_same_within_tolerance(10.0, 11.0, 0.05));
        assert!(!values_same_within_tolerance(10.0, 11.0, 0.095));
        // 1 / 11 ~ 0.091
        assert!(values_same_within_tolerance(11.0, 10.0, 0.095));
    }

    #[test]
    fn tolerance_handles_zero() {
        assert!(values_same_within_tolerance(0.0, 0.0, 0.0));
        assert!(!values_same_within_tolerance(0.0, 1.0, 0.5));
        assert!(values_same_within_tolerance(0.0, 0.0, 0.1));
    }

    #[test]
    fn tolerance_handles_negative_temperatures() {
        assert!(values_same_within_tolerance(-10.0, -10.5, 0.1));
        assert!(!values_same_within_tolerance(-10.0, -12.0, 0.1));
    }

    #[test]
    fn tolerance_bounds_checked() {
        assert!(Tolerance::new(0.0).is_ok());
        assert!(Tolerance::new(0.99).is_ok());
        assert!(Tolerance::new(1.0).is_err());
        assert!(Tolerance::new(-0.01).is_err());
        assert!(Tolerance::new(f64::NAN).is_err());
    }
}
