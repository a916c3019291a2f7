//! Image directory handling: numbered frame files and startup cleanup.

use crate::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use zerberus_camera::Frame;

/// How many stored frames survive on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Files accumulate for the lifetime of the directory.
    #[default]
    KeepAll,
    /// Ring of the newest `k` files; older ones are deleted after each write.
    KeepLast(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFrame {
    pub index: u64,
    pub path: PathBuf,
}

/// Writes frames as `<index>.png`, index starting at 0 and never reused.
#[derive(Debug)]
pub struct FrameStore {
    dir: PathBuf,
    retention: RetentionPolicy,
    next: u64,
}

impl FrameStore {
    /// Create `dir` (and parents) if needed.
    pub fn create(dir: impl Into<PathBuf>, retention: RetentionPolicy) -> Result<Self> {
        if retention == RetentionPolicy::KeepLast(0) {
            return Err(VisionError::Config("retention must keep at least one frame".into()));
        }
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| VisionError::io(format!("create {}", dir.display()), e))?;
        Ok(Self { dir, retention, next: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn next_index(&self) -> u64 {
        self.next
    }

    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{index}.png"))
    }

    pub fn persist(&mut self, frame: &Frame) -> Result<StoredFrame> {
        let index = self.next;
        let path = self.path_for(index);
        frame
            .save(&path)
            .map_err(|e| VisionError::io(format!("write {}", path.display()), e))?;
        self.next += 1;

        if let RetentionPolicy::KeepLast(k) = self.retention {
            if let Some(old) = index.checked_sub(k as u64) {
                let old = self.path_for(old);
                match fs::remove_file(&old) {
                    Ok(()) => log::debug!("retention: removed {}", old.display()),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(VisionError::io(format!("remove {}", old.display()), e)),
                }
            }
        }

        Ok(StoredFrame { index, path })
    }

    pub fn load(&self, path: &Path) -> Result<Frame> {
        Frame::open(path).map_err(|e| VisionError::io(format!("read {}", path.display()), e))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

/// Empty `dir` of files, creating it first if absent.
///
/// A file that cannot be removed is logged and counted, the sweep goes on.
/// Only failing to create or list the directory is fatal.
pub fn clear_image_dir(dir: &Path) -> Result<CleanupReport> {
    fs::create_dir_all(dir).map_err(|e| VisionError::io(format!("create {}", dir.display()), e))?;
    let entries = fs::read_dir(dir).map_err(|e| VisionError::io(format!("list {}", dir.display()), e))?;

    let mut report = CleanupReport::default();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("cleanup: unreadable entry in {}: {e}", dir.display());
                report.failed += 1;
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            log::debug!("cleanup: skipping directory {}", path.display());
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                log::warn!("cleanup: could not remove {}: {e}", path.display());
                report.failed += 1;
            }
        }
    }
    log::info!("cleanup of {}: {} removed, {} failed", dir.display(), report.removed, report.failed);
    Ok(report)
}
