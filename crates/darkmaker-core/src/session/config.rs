use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::calibrate::CalibrationSpec;
use crate::consts::DEFAULT_DISPOSITION_SUBFOLDER;
use crate::error::{DarkMakerError, Result};
use crate::group::GroupingConfig;
use crate::stack::CombineMethod;

/// Where combined masters go.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OutputTarget {
    /// Single-set processing writes exactly this file (`%d`/`%t` expanded).
    File(PathBuf),
    /// Grouped processing writes one generated file name per group here.
    Directory(PathBuf),
}

/// What happens to input files after their master has been written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum InputDisposition {
    #[default]
    Nothing,
    /// Move inputs into a subfolder beside them. `%d`/`%t` in the name
    /// expand to the current date and time.
    SubFolder { name_template: String },
}

impl InputDisposition {
    pub fn default_subfolder() -> Self {
        Self::SubFolder {
            name_template: DEFAULT_DISPOSITION_SUBFOLDER.to_string(),
        }
    }
}

/// Immutable settings for one combination session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub output: OutputTarget,
    #[serde(default)]
    pub method: CombineMethod,
    #[serde(default)]
    pub calibration: CalibrationSpec,
    #[serde(default)]
    pub grouping: GroupingConfig,
    /// Combine frames even if they are not all marked as darks.
    #[serde(default)]
    pub ignore_file_type: bool,
    /// In grouped processing, skip groups with fewer frames than this.
    #[serde(default)]
    pub min_group_size: Option<usize>,
    #[serde(default)]
    pub disposition: InputDisposition,
}

impl SessionConfig {
    pub fn new(output: OutputTarget) -> Self {
        Self {
            output,
            method: CombineMethod::default(),
            calibration: CalibrationSpec::default(),
            grouping: GroupingConfig::default(),
            ignore_file_type: false,
            min_group_size: None,
            disposition: InputDisposition::default(),
        }
    }

    /// Boundary checks on every setting; run once at session start.
    pub fn validate(&self) -> Result<()> {
        self.method.validate()?;
        self.calibration.validate()?;

        match (&self.output, self.grouping.is_grouped()) {
            (OutputTarget::File(_), true) => {
                return Err(DarkMakerError::InvalidConfig(
                    "grouped processing needs an output directory".into(),
                ))
            }
            (OutputTarget::Directory(_), false) => {
                return Err(DarkMakerError::InvalidConfig(
                    "single-set processing needs an output file".into(),
                ))
            }
            _ => {}
        }

        if self.min_group_size == Some(0) {
            return Err(DarkMakerError::InvalidConfig(
                "minimum group size must be at least 1".into(),
            ));
        }
        if let InputDisposition::SubFolder { name_template } = &self.disposition {
            if name_template.trim().is_empty() {
                return Err(DarkMakerError::InvalidConfig(
                    "disposition subfolder name is empty".into(),
                ));
            }
        }
        Ok(())
    }
}
