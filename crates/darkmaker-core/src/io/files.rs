use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::consts::UNIQUE_NAME_ATTEMPTS;
use crate::error::{DarkMakerError, Result};
use crate::frame::FrameDescriptor;

const FITS_EXTENSIONS: [&str; 3] = ["fit", "fits", "fts"];

/// FITS files directly inside `dir`, sorted by path.
pub fn list_fits_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_fits_path(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_fits_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FITS_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Make sure `dir` exists as a directory, creating it if nothing is there.
///
/// Fails with `NoGroupOutputDirectory` if a non-directory occupies the
/// name or creation fails.
pub fn ensure_directory_exists(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        warn!(path = %dir.display(), "A file (not a directory) already exists with this name");
        return Err(DarkMakerError::NoGroupOutputDirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir).map_err(|e| {
        warn!(path = %dir.display(), error = %e, "Unable to create directory");
        DarkMakerError::NoGroupOutputDirectory(dir.to_path_buf())
    })
}

/// Replace `%d`/`%D` with `YYYY-MM-DD` and `%t`/`%T` with `HH-MM-SS`.
pub fn substitute_date_time(template: &str, now: DateTime<Local>) -> String {
    let date = now.format("%Y-%m-%d").to_string();
    let time = now.format("%H-%M-%S").to_string();
    template
        .replace("%d", &date)
        .replace("%D", &date)
        .replace("%t", &time)
        .replace("%T", &time)
}

/// A path for `file_name` in `dir` that does not exist yet.
///
/// Tries the bare name, then `1-name`, `2-name`, ...
pub fn unique_destination(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return Ok(candidate);
    }
    (1..=UNIQUE_NAME_ATTEMPTS)
        .map(|counter| dir.join(format!("{counter}-{file_name}")))
        .find(|p| !p.exists())
        .ok_or_else(|| {
            DarkMakerError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!(
                    "no unique name for {file_name} in {} after {UNIQUE_NAME_ATTEMPTS} tries",
                    dir.display()
                ),
            ))
        })
}

/// Move the processed inputs into a subfolder next to the first of them.
///
/// Returns the folder that received the files.
pub fn move_to_subfolder(
    descriptors: &[FrameDescriptor],
    folder_template: &str,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let Some(first) = descriptors.first() else {
        return Err(DarkMakerError::EmptySequence);
    };
    let folder_name = substitute_date_time(folder_template, now);
    let parent = first.path().parent().unwrap_or_else(|| Path::new("."));
    let folder = parent.join(folder_name);
    ensure_directory_exists(&folder)?;

    for descriptor in descriptors {
        let destination = unique_destination(&folder, descriptor.name())?;
        debug!(
            from = %descriptor.path().display(),
            to = %destination.display(),
            "Moving input file"
        );
        fs::rename(descriptor.path(), &destination)
            .map_err(|_| DarkMakerError::FileNotFound(descriptor.path().to_path_buf()))?;
    }
    Ok(folder)
}
