/// Largest value a 16-bit unsigned sensor can report.
pub const PIXEL_MAX: f32 = 65_535.0;

/// Largest pedestal accepted for pedestal precalibration.
pub const MAX_PEDESTAL: u16 = 32_767;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum number of frames for sigma-clip combination.
pub const SIGMA_CLIP_MIN_FILES: usize = 3;

/// Default number of values dropped from each end in min/max clipping.
pub const DEFAULT_MIN_MAX_DROP: usize = 2;

/// Default sigma-clip rejection threshold.
pub const DEFAULT_SIGMA_THRESHOLD: f64 = 2.0;

/// Default fractional exposure tolerance for exposure grouping (5%).
pub const DEFAULT_EXPOSURE_TOLERANCE: f64 = 0.05;

/// Default fractional temperature tolerance for temperature grouping (10%).
pub const DEFAULT_TEMPERATURE_TOLERANCE: f64 = 0.10;

/// Default pedestal amount.
pub const DEFAULT_PEDESTAL: u16 = 100;

/// Default name template for the subfolder that receives processed inputs.
pub const DEFAULT_DISPOSITION_SUBFOLDER: &str = "originals-%d-%t";

/// Attempts made to find a free file name when moving inputs aside.
pub const UNIQUE_NAME_ATTEMPTS: usize = 5_000;

/// Extension used for written master frames.
pub const MASTER_FILE_EXTENSION: &str = "fits";
