#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ndarray::Array3;

use darkmaker_core::console::{Console, ConsoleLine};
use darkmaker_core::error::{DarkMakerError, Result};
use darkmaker_core::frame::{Frame, FrameDescriptor, FrameType, MasterFrame, MasterMetadata};
use darkmaker_core::io::fits::write_master;
use darkmaker_core::io::FrameStore;

/// A dark frame descriptor with the given geometry and acquisition values.
pub fn dark(path: impl Into<PathBuf>, size: (u32, u32, u32), exposure: f64, temp: f64) -> FrameDescriptor {
    FrameDescriptor::new(path, size.0, size.1, size.2)
        .unwrap()
        .with_exposure(exposure)
        .with_temperature(temp)
        .with_frame_type(FrameType::Dark)
}

/// Single-layer frame filled with `value`.
pub fn flat_frame(height: usize, width: usize, value: f32) -> Frame {
    Frame::new(Array3::from_elem((1, height, width), value))
}

/// In-memory frame store. Files "exist" once inserted; reads are counted.
#[derive(Default)]
pub struct MemoryStore {
    frames: HashMap<PathBuf, (FrameDescriptor, Frame)>,
    pub written: Mutex<Vec<(PathBuf, MasterFrame)>>,
    pub frame_reads: AtomicUsize,
    /// Writes to these paths fail with `PermissionError`.
    pub deny_writes: Vec<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: FrameDescriptor, frame: Frame) {
        self.frames
            .insert(descriptor.path().to_path_buf(), (descriptor, frame));
    }

    pub fn reads(&self) -> usize {
        self.frame_reads.load(Ordering::SeqCst)
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn master(&self, path: &Path) -> Option<MasterFrame> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, m)| m.clone())
    }
}

impl FrameStore for MemoryStore {
    fn read_descriptor(&self, path: &Path) -> Result<FrameDescriptor> {
        self.frames
            .get(path)
            .map(|(d, _)| d.clone())
            .ok_or_else(|| DarkMakerError::FileNotFound(path.to_path_buf()))
    }

    fn read_frame(&self, path: &Path) -> Result<Frame> {
        self.frame_reads.fetch_add(1, Ordering::SeqCst);
        self.frames
            .get(path)
            .map(|(_, f)| f.clone())
            .ok_or_else(|| DarkMakerError::FileNotFound(path.to_path_buf()))
    }

    fn list_frames(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = self
            .frames
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn write_master(&self, path: &Path, master: &MasterFrame) -> Result<()> {
        if self.deny_writes.iter().any(|p| p == path) {
            return Err(DarkMakerError::PermissionError(path.to_path_buf()));
        }
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), master.clone()));
        Ok(())
    }
}

/// Console that keeps every line for inspection.
#[derive(Default)]
pub struct RecordingConsole {
    pub lines: Mutex<Vec<ConsoleLine>>,
}

impl RecordingConsole {
    pub fn texts(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.text.clone())
            .collect()
    }
}

impl Console for RecordingConsole {
    fn message(&self, text: &str, indent_delta: i32, transient: bool) {
        self.lines.lock().unwrap().push(ConsoleLine {
            text: text.to_string(),
            indent: indent_delta,
            transient,
        });
    }
}

/// Write a FITS dark frame to disk using the master writer.
pub fn write_dark_fits(path: &Path, frame: Frame, exposure: f64, temp: f64, filter: &str) {
    let master = MasterFrame {
        frame,
        metadata: MasterMetadata {
            frame_type: FrameType::Dark,
            exposure,
            temperature: temp,
            filter: filter.to_string(),
            binning: 1,
            description: "test fixture".to_string(),
        },
    };
    write_master(path, &master).unwrap();
}
