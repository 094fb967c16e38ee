pub mod files;
pub mod fits;

use std::path::{Path, PathBuf};

use crate::error::{DarkMakerError, Result};
use crate::frame::{Frame, FrameDescriptor, MasterFrame};

/// Storage collaborator the session needs: descriptor and pixel reads,
/// directory listing and master-frame writes.
///
/// `FitsStore` is the on-disk implementation. Tests substitute in-memory
/// stores.
pub trait FrameStore: Send + Sync {
    /// Read metadata only. Fails with `FileNotFound` if the path is unreadable.
    fn read_descriptor(&self, path: &Path) -> Result<FrameDescriptor>;

    /// Read the pixel data of one frame.
    fn read_frame(&self, path: &Path) -> Result<Frame>;

    /// Paths of the candidate frames in a directory, in a stable order.
    fn list_frames(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Write a combined master. Fails with `PermissionError` if denied.
    fn write_master(&self, path: &Path, master: &MasterFrame) -> Result<()>;
}

/// FITS files on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FitsStore;

impl FrameStore for FitsStore {
    fn read_descriptor(&self, path: &Path) -> Result<FrameDescriptor> {
        fits::FitsReader::open(path)?.descriptor()
    }

    fn read_frame(&self, path: &Path) -> Result<Frame> {
        fits::FitsReader::open(path)?.read_frame()
    }

    fn list_frames(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        files::list_fits_files(dir)
    }

    fn write_master(&self, path: &Path, master: &MasterFrame) -> Result<()> {
        fits::write_master(path, master)
    }
}

/// Build descriptors for a set of input paths, one per readable frame.
pub fn scan_descriptors(store: &dyn FrameStore, paths: &[PathBuf]) -> Result<Vec<FrameDescriptor>> {
    paths
        .iter()
        .map(|path| {
            store.read_descriptor(path).map_err(|e| match e {
                DarkMakerError::Io(_) => DarkMakerError::FileNotFound(path.clone()),
                other => other,
            })
        })
        .collect()
}
