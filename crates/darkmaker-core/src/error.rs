use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DarkMakerError {
    #[error("File not found or unreadable: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Frames do not all have the same dimensions and binning")]
    IncompatibleSizes,

    #[error("Not all selected files are dark frames")]
    NotAllDarkFrames,

    #[error("Output directory {} does not exist and could not be created", .0.display())]
    NoGroupOutputDirectory(PathBuf),

    #[error("Auto-calibration directory {} does not exist", .0.display())]
    NoAutoCalibrationDirectory(PathBuf),

    #[error("Auto-calibration directory {} contains no frames", .0.display())]
    AutoCalibrationDirectoryEmpty(PathBuf),

    #[error("No calibration frame in the auto-calibration directory matches the frame size and binning")]
    NoSuitableAutoBias,

    #[error("Permission denied writing {}", .0.display())]
    PermissionError(PathBuf),

    #[error("{method} needs at least {required} files, {found} selected")]
    NotEnoughFiles {
        method: String,
        required: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty frame sequence")]
    EmptySequence,
}

/// Stable user-facing classification of a failure.
///
/// Every error variant maps to exactly one category; hosts key their
/// dialogs and exit messages on this rather than on the display string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    MissingFile,
    SizeMismatch,
    FileType,
    OutputDirectory,
    CalibrationSource,
    WriteDenied,
    TooFewFiles,
    Configuration,
    Container,
    Internal,
}

impl ErrorCategory {
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingFile => "File not found",
            Self::SizeMismatch => "Incompatible frame sizes",
            Self::FileType => "Wrong frame type",
            Self::OutputDirectory => "Output directory unavailable",
            Self::CalibrationSource => "Calibration source unavailable",
            Self::WriteDenied => "Unable to write output",
            Self::TooFewFiles => "Not enough files",
            Self::Configuration => "Invalid settings",
            Self::Container => "Unreadable image file",
            Self::Internal => "Internal error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl DarkMakerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound(_) => ErrorCategory::MissingFile,
            Self::IncompatibleSizes => ErrorCategory::SizeMismatch,
            Self::NotAllDarkFrames => ErrorCategory::FileType,
            Self::NoGroupOutputDirectory(_) => ErrorCategory::OutputDirectory,
            Self::NoAutoCalibrationDirectory(_)
            | Self::AutoCalibrationDirectoryEmpty(_)
            | Self::NoSuitableAutoBias => ErrorCategory::CalibrationSource,
            Self::PermissionError(_) => ErrorCategory::WriteDenied,
            Self::NotEnoughFiles { .. } => ErrorCategory::TooFewFiles,
            Self::InvalidConfig(_) => ErrorCategory::Configuration,
            Self::InvalidFits(_) => ErrorCategory::Container,
            Self::Io(_) | Self::EmptySequence => ErrorCategory::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, DarkMakerError>;
