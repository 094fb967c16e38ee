use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DarkMakerError, Result};

/// Acquisition type recorded in a frame's header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    Bias,
    Dark,
    Flat,
    Light,
    #[default]
    Unknown,
}

impl FrameType {
    /// Classify a free-form `IMAGETYP` value ("Dark Frame", "BIAS", ...).
    pub fn from_header_value(value: &str) -> Self {
        let lower = value.to_ascii_lowercase();
        if lower.contains("bias") {
            Self::Bias
        } else if lower.contains("dark") {
            Self::Dark
        } else if lower.contains("flat") {
            Self::Flat
        } else if lower.contains("light") {
            Self::Light
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bias => write!(f, "Bias"),
            Self::Dark => write!(f, "Dark"),
            Self::Flat => write!(f, "Flat"),
            Self::Light => write!(f, "Light"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Exact-match grouping key: (width, height, binning).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SizeKey {
    pub width: u32,
    pub height: u32,
    pub binning: u32,
}

impl std::fmt::Display for SizeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} binned {}x{}",
            self.width, self.height, self.binning, self.binning
        )
    }
}

/// Metadata for one candidate input frame, read without loading pixels.
///
/// Width, height and binning are always positive; the constructor rejects
/// anything else.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDescriptor {
    path: PathBuf,
    name: String,
    width: u32,
    height: u32,
    binning: u32,
    exposure: f64,
    temperature: f64,
    filter: String,
    frame_type: FrameType,
}

impl FrameDescriptor {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32, binning: u32) -> Result<Self> {
        if width == 0 || height == 0 || binning == 0 {
            return Err(DarkMakerError::InvalidFits(format!(
                "non-positive geometry {width}x{height} binning {binning}"
            )));
        }
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path,
            name,
            width,
            height,
            binning,
            exposure: 0.0,
            temperature: 0.0,
            filter: String::new(),
            frame_type: FrameType::Unknown,
        })
    }

    /// Exposure in seconds. Negative values are stored as zero.
    pub fn with_exposure(mut self, seconds: f64) -> Self {
        self.exposure = seconds.max(0.0);
        self
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = celsius;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = frame_type;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn binning(&self) -> u32 {
        self.binning
    }

    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    pub fn size_key(&self) -> SizeKey {
        SizeKey {
            width: self.width,
            height: self.height,
            binning: self.binning,
        }
    }
}

/// Pixel data for one frame.
///
/// Shape is `(layers, height, width)`; values are raw sensor ADU, not
/// normalized. Most sensors produce a single layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub data: Array3<f32>,
}

impl Frame {
    pub fn new(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Wrap a single 2-D plane as a one-layer frame.
    pub fn from_plane(plane: Array2<f32>) -> Self {
        Self {
            data: plane.insert_axis(Axis(0)),
        }
    }

    pub fn layers(&self) -> usize {
        self.data.dim().0
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }
}

/// Header values written alongside a combined master frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MasterMetadata {
    pub frame_type: FrameType,
    pub exposure: f64,
    pub temperature: f64,
    pub filter: String,
    pub binning: u32,
    pub description: String,
}

/// A combined master frame ready to hand to the container writer.
#[derive(Clone, Debug)]
pub struct MasterFrame {
    pub frame: Frame,
    pub metadata: MasterMetadata,
}
