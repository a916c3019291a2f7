//! How long does the camera take for `n` pictures?

use crate::store::{clear_image_dir, CleanupReport};
use crate::{Result, Shutdown, VisionError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, ErrorKind, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use zerberus_camera::{CameraConfig, ContinuousCapture, ExposureProfile, FrameSource};

pub const PROMPT: &str = "Number of images to take";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub image_dir: PathBuf,
    /// Pause after every capture; zero disables it.
    pub interval: Duration,
    /// Skip the prompt when set.
    pub count: Option<u64>,
    pub camera: CameraConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("./../pictures/all_images/"),
            interval: Duration::from_secs(1),
            count: None,
            camera: CameraConfig {
                vflip: true,
                exposure: ExposureProfile::Night,
                ..CameraConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub requested: u64,
    pub captured: u64,
    pub elapsed: Duration,
    pub cleanup: CleanupReport,
}

/// Prompt on `out` and parse a picture count from one line of `input`.
///
/// The prompt stays on the same line as the answer.
pub fn read_count<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<u64> {
    write!(out, "{PROMPT}")?;
    out.flush()?;

    let mut line = String::new();
    let n = input.read_line(&mut line).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => VisionError::Config("picture count is not valid UTF-8".into()),
        _ => VisionError::io("read picture count", e),
    })?;
    if n == 0 {
        return Err(VisionError::Config("no picture count given".into()));
    }
    let line = line.trim();
    line.parse::<u64>()
        .map_err(|_| VisionError::Config(format!("{line:?} is not a picture count")))
}

/// A cleaned image directory and a known picture count, camera not opened yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub requested: u64,
    pub cleanup: CleanupReport,
}

/// Clear the image directory, then take the count from `config.count` or
/// the prompt.
pub fn prepare<R: BufRead, W: Write>(config: &BenchConfig, input: &mut R, out: &mut W) -> Result<Batch> {
    let cleanup = clear_image_dir(&config.image_dir)?;
    let requested = match config.count {
        Some(n) => n,
        None => read_count(input, out)?,
    };
    Ok(Batch { requested, cleanup })
}

impl Batch {
    /// Open the camera and time `requested` captures.
    ///
    /// The camera is always configured upside down with the night exposure
    /// profile, whatever `config.camera` says. A token that is already
    /// triggered fails with [`VisionError::Interrupted`] before anything is
    /// opened. One triggered mid-batch ends it early, and the summary line
    /// reports the pictures actually taken.
    pub fn capture<S, F, W>(self, open: F, config: &BenchConfig, shutdown: &Shutdown, out: &mut W) -> Result<BenchReport>
    where
        S: FrameSource,
        F: FnOnce(&CameraConfig) -> zerberus_camera::Result<S>,
        W: Write,
    {
        if shutdown.is_triggered() {
            return Err(VisionError::Interrupted("the first capture"));
        }
        let Batch { requested, cleanup } = self;
        let cam_cfg = CameraConfig {
            vflip: true,
            exposure: ExposureProfile::Night,
            ..config.camera.clone()
        };

        writeln!(out, "Taking a {requested} pictures to time how long it takes")?;
        let start = Instant::now();
        let mut captured = 0;

        if requested > 0 {
            let camera = open(&cam_cfg)?;
            let mut capture = ContinuousCapture::new(camera, &config.image_dir);
            while captured < requested && !shutdown.is_triggered() {
                match capture.next() {
                    Some(Ok(path)) => log::debug!("captured {}", path.display()),
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
                if !config.interval.is_zero() {
                    std::thread::sleep(config.interval);
                }
                captured += 1;
            }
        }

        let elapsed = start.elapsed();
        if captured < requested {
            log::warn!("stopped after {captured} of {requested} pictures");
        }
        writeln!(out, "{captured}  pictures:  {}", elapsed.as_secs_f64())?;
        Ok(BenchReport { requested, captured, elapsed, cleanup })
    }
}

/// [`prepare`] then [`Batch::capture`].
///
/// The prompt is answered before `open` is called, so bad input never
/// reaches the device.
pub fn run<S, F, R, W>(
    open: F,
    config: &BenchConfig,
    input: &mut R,
    shutdown: &Shutdown,
    out: &mut W,
) -> Result<BenchReport>
where
    S: FrameSource,
    F: FnOnce(&CameraConfig) -> zerberus_camera::Result<S>,
    R: BufRead,
    W: Write,
{
    prepare(config, input, out)?.capture(open, config, shutdown, out)
}
