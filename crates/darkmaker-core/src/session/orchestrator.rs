use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::calibrate::{self, CalibrationSpec};
use crate::console::Console;
use crate::error::{DarkMakerError, Result};
use crate::frame::{FrameDescriptor, FrameType, MasterFrame, MasterMetadata};
use crate::group::group_frames;
use crate::io::files::{ensure_directory_exists, move_to_subfolder, substitute_date_time};
use crate::io::FrameStore;
use crate::stack::combine;

use super::config::{InputDisposition, OutputTarget, SessionConfig};
use super::helpers::{
    all_compatible_sizes, all_of_type, group_file_name, mean_exposure_and_temperature,
    most_common_filter_name,
};
use super::types::{CancelFlag, SessionOutcome, SessionState};

/// Collaborators and settings shared by every step of one session.
struct Session<'a> {
    config: &'a SessionConfig,
    store: &'a dyn FrameStore,
    console: &'a dyn Console,
    cancel: &'a CancelFlag,
    written: Vec<PathBuf>,
}

/// Run one combination session to completion.
///
/// Every failure is caught here, reported on the console and returned as
/// `SessionOutcome::Failed`. The first failing group ends the session;
/// groups after it are not attempted.
pub fn run_session(
    descriptors: Vec<FrameDescriptor>,
    config: &SessionConfig,
    store: &dyn FrameStore,
    console: &dyn Console,
    cancel: &CancelFlag,
) -> SessionOutcome {
    let mut session = Session {
        config,
        store,
        console,
        cancel,
        written: Vec::new(),
    };
    console.message("Starting session", 0, false);

    let outcome = match session.run(descriptors) {
        Ok(state) if state == SessionState::Cancelled => {
            console.message("Session cancelled", 0, false);
            SessionOutcome::Cancelled {
                written: session.written,
            }
        }
        Ok(_) => {
            console.message(
                &format!("Session complete, {} master file(s) written", session.written.len()),
                0,
                false,
            );
            SessionOutcome::Completed {
                written: session.written,
            }
        }
        Err(e) => {
            warn!(error = %e, "Session failed");
            console.message(&format!("{}: {}", e.category(), e), 0, false);
            for path in &session.written {
                console.message(&format!("Written before failure: {}", path.display()), 1, false);
            }
            SessionOutcome::Failed(e)
        }
    };
    info!(state = %outcome.state(), "Session finished");
    outcome
}

impl Session<'_> {
    fn enter(&self, state: SessionState) {
        debug!(state = %state, "Session state");
    }

    fn run(&mut self, descriptors: Vec<FrameDescriptor>) -> Result<SessionState> {
        self.enter(SessionState::Validating);
        self.validate_selection(&descriptors)?;

        let config = self.config;
        match &config.output {
            OutputTarget::Directory(dir) => {
                self.enter(SessionState::GroupedProcessing);
                self.process_groups(descriptors, dir)
            }
            OutputTarget::File(path) => {
                self.enter(SessionState::SingleSetProcessing);
                self.process_single_set(descriptors, path)
            }
        }
    }

    /// Whole-selection checks made before any group is touched.
    fn validate_selection(&self, descriptors: &[FrameDescriptor]) -> Result<()> {
        self.config.validate()?;

        match &self.config.calibration {
            CalibrationSpec::FixedFile { path } => {
                let reference = self.store.read_descriptor(path).map_err(|e| match e {
                    DarkMakerError::Io(_) => DarkMakerError::FileNotFound(path.clone()),
                    other => other,
                })?;
                if !self.config.grouping.by_size {
                    let mut with_reference = descriptors.to_vec();
                    with_reference.push(reference);
                    if !all_compatible_sizes(&with_reference) {
                        return Err(DarkMakerError::IncompatibleSizes);
                    }
                }
            }
            CalibrationSpec::AutoDirectory { path } if !path.is_dir() => {
                return Err(DarkMakerError::NoAutoCalibrationDirectory(path.clone()));
            }
            _ => {}
        }

        if self.config.grouping.by_size {
            self.check_frame_types(descriptors)?;
            self.config.method.check_file_count(descriptors.len())
        } else {
            self.validate_group(descriptors)
        }
    }

    /// Checks repeated for every group just before it is combined.
    fn validate_group(&self, group: &[FrameDescriptor]) -> Result<()> {
        if !all_compatible_sizes(group) {
            return Err(DarkMakerError::IncompatibleSizes);
        }
        self.check_frame_types(group)?;
        self.config.method.check_file_count(group.len())
    }

    fn check_frame_types(&self, descriptors: &[FrameDescriptor]) -> Result<()> {
        if self.config.ignore_file_type || all_of_type(descriptors, FrameType::Dark) {
            Ok(())
        } else {
            Err(DarkMakerError::NotAllDarkFrames)
        }
    }

    fn process_groups(
        &mut self,
        descriptors: Vec<FrameDescriptor>,
        output_dir: &Path,
    ) -> Result<SessionState> {
        ensure_directory_exists(output_dir)?;
        self.console.message(
            &format!("Writing group masters to {}", output_dir.display()),
            0,
            false,
        );

        let groups = group_frames(descriptors, &self.config.grouping);
        info!(groups = groups.len(), "Grouped selection");

        for group in groups {
            if self.cancel.is_cancelled() {
                return Ok(SessionState::Cancelled);
            }
            if let Some(min) = self.config.min_group_size {
                if group.len() < min {
                    self.console.message(
                        &format!(
                            "Ignoring group of {} files sized {} (fewer than {min})",
                            group.len(),
                            group[0].size_key()
                        ),
                        1,
                        false,
                    );
                    continue;
                }
            }

            self.validate_group(&group)?;
            let output = output_dir.join(group_file_name(&self.config.method, &group[0]));
            self.process_one_group(&group, &output)?;
        }
        Ok(SessionState::Completed)
    }

    fn process_single_set(
        &mut self,
        descriptors: Vec<FrameDescriptor>,
        output_file: &Path,
    ) -> Result<SessionState> {
        if self.cancel.is_cancelled() {
            return Ok(SessionState::Cancelled);
        }
        let output = PathBuf::from(substitute_date_time(
            &output_file.to_string_lossy(),
            Local::now(),
        ));
        self.process_one_group(&descriptors, &output)?;
        Ok(SessionState::Completed)
    }

    /// Load, calibrate, combine and write one group, then dispose of its
    /// inputs.
    fn process_one_group(&mut self, group: &[FrameDescriptor], output: &Path) -> Result<()> {
        let sample = &group[0];
        self.console.message(
            &format!(
                "Processing {} files binned {} x {}, {} seconds at {} degrees",
                group.len(),
                sample.binning(),
                sample.binning(),
                sample.exposure(),
                sample.temperature()
            ),
            1,
            false,
        );

        let mut frames = Vec::with_capacity(group.len());
        for (i, descriptor) in group.iter().enumerate() {
            self.console.message(
                &format!("Reading {} ({}/{})", descriptor.name(), i + 1, group.len()),
                2,
                true,
            );
            frames.push(self.store.read_frame(descriptor.path())?);
        }

        let frames = calibrate::calibrate(
            frames,
            &self.config.calibration,
            sample,
            self.store,
            self.console,
        )?;

        self.console
            .message(&format!("Combining with {}", self.config.method), 2, true);
        let combined = combine(&frames, &self.config.method)?;

        let (exposure, temperature) = mean_exposure_and_temperature(group);
        let master = MasterFrame {
            frame: combined,
            metadata: MasterMetadata {
                frame_type: FrameType::Dark,
                exposure,
                temperature,
                filter: most_common_filter_name(group),
                binning: sample.binning(),
                description: self.config.method.description(),
            },
        };
        self.store.write_master(output, &master)?;
        self.written.push(output.to_path_buf());
        self.console
            .message(&format!("Wrote {}", output.display()), 2, false);

        if let InputDisposition::SubFolder { name_template } = &self.config.disposition {
            let folder = move_to_subfolder(group, name_template, Local::now())?;
            self.console.message(
                &format!("Moved {} input files to {}", group.len(), folder.display()),
                2,
                false,
            );
        }
        Ok(())
    }
}
