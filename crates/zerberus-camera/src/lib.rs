// zerberus-camera/src/lib.rs
// ============================================================
// Blocking camera capture crate for the Zerberus robot
// Uses GStreamer (libcamera on the Pi, V4L2 elsewhere) to grab
// packed RGB frames into host memory, one frame per call.
// ------------------------------------------------------------
// Public API:
//   * Camera::open(&cfg)            – build and start a pipeline
//   * FrameSource::read_frame()     – one blocking Frame
//   * ContinuousCapture             – frames → numbered files
// ------------------------------------------------------------
// Build notes
//   * Compile on ARM & x86_64 (libcamera optional on desktops).
// ============================================================

//! Zerberus – camera capture layer
//!
//! This crate exposes a small, synchronous camera API around a
//! `gstreamer` pipeline ending in an `appsink`.  Frames are delivered as
//! [`Frame`], an `H×W×3` RGB array plus the buffer timestamp.  The device
//! is owned by [`Camera`] and released when it is dropped, so every exit
//! path of a capture loop gives the camera back.
//!
//! Anything that produces frames implements [`FrameSource`]; the capture
//! loops are written against the trait so they can run on synthetic
//! sources in tests.

use gst::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

mod frame;
mod stream;
pub use frame::Frame;
pub use stream::ContinuousCapture;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("GStreamer init failed: {0}")]
    GstInit(#[source] gst::glib::Error),
    #[error("Failed to parse pipeline: {0}")]
    ParsePipeline(#[source] gst::glib::Error),
    #[error("Pipeline is not a gst::Pipeline")]
    NotPipeline,
    #[error("AppSink element not found")]
    AppSinkNotFound,
    #[error("AppSink element downcast failed")]
    AppSinkDowncastFailed,
    #[error("Failed to set pipeline to Playing: {0}")]
    StateChange(#[source] gst::StateChangeError),
    #[error("Device returned no frame: {0}")]
    NoFrame(String),
    #[error("Sample has no buffer")]
    MissingBuffer,
    #[error("Sample has no caps")]
    MissingCaps,
    #[error("Caps missing struct")]
    MissingStructure,
    #[error("Failed to get field value: {0}")]
    FieldError(String),
    #[error("Buffer map failed: {0}")]
    BufferMap(String),
    #[error("Invalid frame: expected {expected} bytes, got {got}")]
    InvalidFrame { expected: usize, got: usize },
    #[error("Unknown exposure profile: {0}")]
    UnknownExposure(String),
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CameraError>;

/// Exposure preset applied by the capture source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureProfile {
    #[default]
    Auto,
    /// Low light: longer exposures, the frame rate is allowed to drop.
    Night,
}

impl FromStr for ExposureProfile {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "night" => Ok(Self::Night),
            other => Err(CameraError::UnknownExposure(other.to_string())),
        }
    }
}

/// Device selection and capture format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// V4L2 device index (`/dev/video<N>`), ignored on libcamera.
    pub device: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Flip in the pipeline, before frames reach the appsink.
    pub vflip: bool,
    pub hflip: bool,
    pub exposure: ExposureProfile,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: 640,
            height: 480,
            fps: 30,
            vflip: false,
            hflip: false,
            exposure: ExposureProfile::Auto,
        }
    }
}

/// Anything that hands out frames one at a time.
///
/// Releasing the underlying device is tied to `Drop`.
pub trait FrameSource {
    /// Block until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame>;
}

/// Build the `gst-launch` description for `cfg`.
///
/// `libcamera` selects `libcamerasrc` over `v4l2src`.
pub fn pipeline_description(cfg: &CameraConfig, libcamera: bool) -> String {
    let src = match (libcamera, cfg.exposure) {
        (true, ExposureProfile::Auto) => "libcamerasrc".to_string(),
        (true, ExposureProfile::Night) => "libcamerasrc ae-exposure-mode=long".to_string(),
        (false, ExposureProfile::Auto) => format!("v4l2src device=/dev/video{}", cfg.device),
        (false, ExposureProfile::Night) => format!(
            "v4l2src device=/dev/video{} extra-controls=\"c,exposure_dynamic_framerate=1\"",
            cfg.device
        ),
    };

    let flip = match (cfg.vflip, cfg.hflip) {
        (true, true) => "videoflip method=rotate-180 ! ",
        (true, false) => "videoflip method=vertical-flip ! ",
        (false, true) => "videoflip method=horizontal-flip ! ",
        (false, false) => "",
    };

    format!(
        "{src} ! videoconvert ! videoscale ! videorate ! {flip}\
        video/x-raw,format=RGB,width={w},height={h},framerate={f}/1 \
        ! queue leaky=2 max-size-buffers=8 ! appsink name=sink sync=false",
        src = src, flip = flip, w = cfg.width, h = cfg.height, f = cfg.fps
    )
}

/// Camera handle – owns the pipeline and *appsink*.
pub struct Camera {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
}

impl Camera {
    /// Build a pipeline that delivers RGB frames and set it to *Playing*.
    ///
    /// ```no_run
    /// use zerberus_camera::{Camera, CameraConfig, FrameSource};
    /// let mut cam = Camera::open(&CameraConfig::default()).unwrap();
    /// for _ in 0..10 {
    ///     let frame = cam.read_frame().unwrap();
    ///     println!("Got {}×{}", frame.width(), frame.height());
    /// }
    /// ```
    pub fn open(cfg: &CameraConfig) -> Result<Self> {
        gst::init().map_err(CameraError::GstInit)?;

        let libcamera = gst::ElementFactory::find("libcamerasrc").is_some();
        let pipe_str = pipeline_description(cfg, libcamera);
        log::info!("opening camera: {pipe_str}");

        let pipeline = gst::parse::launch(&pipe_str)
            .map_err(CameraError::ParsePipeline)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| CameraError::NotPipeline)?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or(CameraError::AppSinkNotFound)?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| CameraError::AppSinkDowncastFailed)?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(CameraError::StateChange)?;

        Ok(Self { pipeline, appsink })
    }

    /// Blocking retrieval; returns `NoFrame` on EOS or a stopped pipeline.
    pub fn next_frame_blocking(&self) -> Result<Frame> {
        let sample = self
            .appsink
            .pull_sample()
            .map_err(|e| CameraError::NoFrame(e.to_string()))?;

        Self::sample_to_frame(sample)
    }

    /// Convert a `gst::Sample` into our [`Frame`] wrapper.
    fn sample_to_frame(sample: gst::Sample) -> Result<Frame> {
        let buffer = sample.buffer().ok_or(CameraError::MissingBuffer)?;
        let caps   = sample.caps().ok_or(CameraError::MissingCaps)?;
        let s      = caps.structure(0).ok_or(CameraError::MissingStructure)?;
        let width  = s.get::<i32>("width").map_err(|e| CameraError::FieldError(e.to_string()))? as u32;
        let height = s.get::<i32>("height").map_err(|e| CameraError::FieldError(e.to_string()))? as u32;

        let pts = buffer
            .pts()
            .map(|t| Duration::from_nanos(t.nseconds()))
            .unwrap_or(Duration::ZERO);

        let map = buffer.map_readable().map_err(|e| CameraError::BufferMap(e.to_string()))?;
        let bytes = pack_rows(map.as_slice(), width as usize, height as usize)?;
        drop(map);

        let mut frame = Frame::from_rgb(width, height, bytes)?;
        frame.pts = pts;
        Ok(frame)
    }
}

impl FrameSource for Camera {
    fn read_frame(&mut self) -> Result<Frame> {
        self.next_frame_blocking()
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        log::info!("releasing camera");
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

/// GStreamer pads packed RGB rows to 4 bytes; strip the padding.
fn pack_rows(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let row = width * 3;
    let stride = (row + 3) & !3;
    let expected = stride * height.saturating_sub(1) + row;
    if height == 0 || width == 0 || data.len() < expected {
        return Err(CameraError::InvalidFrame { expected, got: data.len() });
    }

    let mut bytes = Vec::with_capacity(row * height);
    for y in 0..height {
        bytes.extend_from_slice(&data[y * stride..y * stride + row]);
    }
    Ok(bytes)
}
