#![allow(dead_code)]

use ndarray::{Array4, ArrayD, IxDyn};
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use zerberus_camera::{CameraError, Frame, FrameSource};
use zerberus_classify::{Classifier, Result as ClassifyResult};
use zerberus_vision::Shutdown;

/// Deterministic gradient frames; `None` frames after `frames` reads.
pub struct SyntheticCamera {
    pub frames: Option<u64>,
    pub served: u64,
    pub released: Arc<AtomicBool>,
}

impl SyntheticCamera {
    pub fn endless() -> (Self, Arc<AtomicBool>) {
        Self::with_frames(None)
    }

    pub fn with_frames(frames: Option<u64>) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        (Self { frames, served: 0, released: Arc::clone(&released) }, released)
    }
}

pub fn gradient(seed: u64) -> Frame {
    let (w, h) = (160u32, 120u32);
    let bytes = (0..w * h * 3).map(|i| ((i as u64 + seed * 7) % 256) as u8).collect();
    Frame::from_rgb(w, h, bytes).unwrap()
}

impl FrameSource for SyntheticCamera {
    fn read_frame(&mut self) -> zerberus_camera::Result<Frame> {
        if self.frames.is_some_and(|n| self.served >= n) {
            return Err(CameraError::NoFrame("synthetic camera drained".into()));
        }
        self.served += 1;
        Ok(gradient(self.served))
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Records input shapes and value ranges; output `[1, 2]` = `[mean, calls]`.
#[derive(Default)]
pub struct RecordingClassifier {
    pub calls: Cell<u64>,
    pub shapes: RefCell<Vec<Vec<usize>>>,
    pub in_range: Cell<bool>,
    /// Trigger this token after `stop_after` calls.
    pub stop: Option<(Shutdown, u64)>,
}

impl RecordingClassifier {
    pub fn new() -> Self {
        Self { in_range: Cell::new(true), ..Default::default() }
    }
}

impl Classifier for RecordingClassifier {
    fn forward(&self, input: &Array4<f32>) -> ClassifyResult<ArrayD<f32>> {
        self.calls.set(self.calls.get() + 1);
        self.shapes.borrow_mut().push(input.shape().to_vec());
        if !input.iter().all(|v| (-1.0..=1.0).contains(v)) {
            self.in_range.set(false);
        }
        if let Some((token, n)) = &self.stop {
            if self.calls.get() >= *n {
                token.trigger();
            }
        }
        let mean = input.mean().unwrap_or(0.0);
        Ok(ArrayD::from_shape_vec(IxDyn(&[1, 2]), vec![mean, self.calls.get() as f32]).unwrap())
    }
}
