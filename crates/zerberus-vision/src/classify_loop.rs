//! Capture → persist → reload → preprocess → classify, forever.
//!
//! Each iteration prints three lines on `out`: the capture latency, the
//! raw first output score and the inference latency.

use crate::store::{FrameStore, RetentionPolicy};
use crate::{Result, Shutdown};
use ndarray::Axis;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use zerberus_camera::{CameraConfig, FrameSource};
use zerberus_classify::{first_score, Classifier, ClassifyError};
use zerberus_preprocess::{correct_orientation, Preprocessor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Where `<n>.png` frames are written.
    pub image_dir: PathBuf,
    pub model_path: PathBuf,
    /// Re-read each frame from disk before preprocessing. When off the
    /// in-memory frame is used; the file is still written.
    pub persist_then_load: bool,
    pub retention: RetentionPolicy,
    /// Stop after this many frames; `None` runs until shutdown or error.
    pub max_iterations: Option<u64>,
    pub camera: CameraConfig,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("./pictures/all_images/"),
            model_path: PathBuf::from("./class_net.onnx"),
            persist_then_load: true,
            retention: RetentionPolicy::KeepAll,
            max_iterations: None,
            camera: CameraConfig::default(),
        }
    }
}

/// Timings and result of one pass through the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub index: u64,
    pub capture: Duration,
    pub inference: Duration,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifySummary {
    pub frames: u64,
    pub last: Option<Iteration>,
}

/// Run the loop until `shutdown`, `config.max_iterations` or the first error.
///
/// `camera` is consumed and dropped before returning, on every path.
pub fn run<S, C, W>(
    mut camera: S,
    classifier: &C,
    store: &mut FrameStore,
    config: &ClassifyConfig,
    shutdown: &Shutdown,
    out: &mut W,
) -> Result<ClassifySummary>
where
    S: FrameSource,
    C: Classifier + ?Sized,
    W: Write,
{
    let pp = Preprocessor::default();
    let mut summary = ClassifySummary::default();

    while !shutdown.is_triggered() {
        if config.max_iterations.is_some_and(|max| summary.frames >= max) {
            break;
        }
        let it = step(&mut camera, classifier, store, &pp, config.persist_then_load, out)?;
        summary.frames += 1;
        summary.last = Some(it);
    }

    log::info!("classify loop stopped after {} frames", summary.frames);
    Ok(summary)
}

fn step<S, C, W>(
    camera: &mut S,
    classifier: &C,
    store: &mut FrameStore,
    pp: &Preprocessor,
    persist_then_load: bool,
    out: &mut W,
) -> Result<Iteration>
where
    S: FrameSource,
    C: Classifier + ?Sized,
    W: Write,
{
    let tstep = Instant::now();

    let frame = correct_orientation(camera.read_frame()?);
    let stored = store.persist(&frame)?;
    let frame = if persist_then_load { store.load(&stored.path)? } else { frame };
    let tensor = pp.run(&frame)?;

    let capture = tstep.elapsed();
    writeln!(out, "Got picture in {}", capture.as_secs_f64())?;

    let tstep = Instant::now();
    let output = classifier.forward(&tensor.insert_axis(Axis(0)))?;
    let score = first_score(&output).ok_or(ClassifyError::NoOutput)?;
    writeln!(out, "{score}")?;

    let inference = tstep.elapsed();
    writeln!(out, "Analysed picture in {}", inference.as_secs_f64())?;

    log::debug!("frame {} → {}", stored.index, stored.path.display());
    Ok(Iteration { index: stored.index, capture, inference, score })
}
