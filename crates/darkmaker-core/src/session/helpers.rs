use std::collections::HashMap;

use crate::consts::MASTER_FILE_EXTENSION;
use crate::frame::{FrameDescriptor, FrameType};
use crate::stack::CombineMethod;

/// True if every descriptor has the same width, height and binning.
pub fn all_compatible_sizes(descriptors: &[FrameDescriptor]) -> bool {
    match descriptors.first() {
        Some(first) => descriptors.iter().all(|d| d.size_key() == first.size_key()),
        None => true,
    }
}

pub fn all_of_type(descriptors: &[FrameDescriptor], frame_type: FrameType) -> bool {
    descriptors.iter().all(|d| d.frame_type() == frame_type)
}

/// Most frequent filter name; ties go to the name seen first.
pub fn most_common_filter_name(descriptors: &[FrameDescriptor]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for d in descriptors {
        *counts.entry(d.filter()).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for d in descriptors {
        let count = counts[d.filter()];
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((d.filter(), count)),
        }
    }
    best.map(|(name, _)| name.to_string()).unwrap_or_default()
}

/// Mean exposure and mean temperature of a non-empty group.
pub fn mean_exposure_and_temperature(descriptors: &[FrameDescriptor]) -> (f64, f64) {
    if descriptors.is_empty() {
        return (0.0, 0.0);
    }
    let n = descriptors.len() as f64;
    let exposure = descriptors.iter().map(FrameDescriptor::exposure).sum::<f64>() / n;
    let temperature = descriptors.iter().map(FrameDescriptor::temperature).sum::<f64>() / n;
    (exposure, temperature)
}

/// Deterministic output name for a group, from its method and first frame.
pub fn group_file_name(method: &CombineMethod, sample: &FrameDescriptor) -> String {
    format!(
        "master-dark-{}-{}x{}-bin{}-{}s-{}C.{}",
        method.file_tag(),
        sample.width(),
        sample.height(),
        sample.binning(),
        sample.exposure(),
        sample.temperature(),
        MASTER_FILE_EXTENSION
    )
}
