// zerberus-camera/src/stream.rs
use crate::{FrameSource, Result};
use std::path::PathBuf;

/// Capture-and-advance: every step grabs one frame and writes it to
/// `<dir>/<counter:03>.jpg`, yielding the path.
///
/// The iterator is fused after the first error.
pub struct ContinuousCapture<S> {
    source: S,
    dir: PathBuf,
    counter: u64,
    failed: bool,
}

impl<S: FrameSource> ContinuousCapture<S> {
    pub fn new(source: S, dir: impl Into<PathBuf>) -> Self {
        Self { source, dir: dir.into(), counter: 0, failed: false }
    }

    /// Number of frames written so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl<S: FrameSource> Iterator for ContinuousCapture<S> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let path = self.dir.join(format!("{:03}.jpg", self.counter));
        let step = self.source.read_frame().and_then(|frame| frame.save(&path));

        match step {
            Ok(()) => {
                self.counter += 1;
                Some(Ok(path))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
