//! Camera controller: capture, store and classify frames until Ctrl-C.
//!
//! Usage: cargo run --bin camera_controller -- [--model ./class_net.onnx]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use zerberus_camera::{Camera, CameraConfig, ExposureProfile};
use zerberus_classify::{TractClassifier, INPUT_SHAPE};
use zerberus_vision::classify_loop::{self, ClassifyConfig};
use zerberus_vision::store::{FrameStore, RetentionPolicy};
use zerberus_vision::Shutdown;

#[derive(Parser, Debug)]
#[command(about = "Capture frames, persist them and run the classifier on each")]
struct CliArgs {
    /// V4L2 device index
    #[arg(long, default_value_t = 0)]
    device: u32,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 480)]
    height: u32,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// auto | night
    #[arg(long, default_value = "auto")]
    exposure: ExposureProfile,

    /// ONNX export of the classifier
    #[arg(long, default_value = "./class_net.onnx")]
    model: PathBuf,

    #[arg(long, default_value = "./pictures/all_images/")]
    image_dir: PathBuf,

    /// Keep only the newest K frames on disk (default: keep all)
    #[arg(long, value_name = "K")]
    keep_last: Option<usize>,

    /// Classify the in-memory frame instead of re-reading the written file
    #[arg(long)]
    skip_reload: bool,

    /// Stop after N frames
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,
}

impl CliArgs {
    fn into_config(self) -> ClassifyConfig {
        ClassifyConfig {
            image_dir: self.image_dir,
            model_path: self.model,
            persist_then_load: !self.skip_reload,
            retention: self.keep_last.map_or(RetentionPolicy::KeepAll, RetentionPolicy::KeepLast),
            max_iterations: self.max_frames,
            camera: CameraConfig {
                device: self.device,
                width: self.width,
                height: self.height,
                fps: self.fps,
                exposure: self.exposure,
                ..CameraConfig::default()
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cfg = CliArgs::parse().into_config();

    let shutdown = Shutdown::new();
    shutdown.install_ctrlc_handler().context("Failed to install Ctrl-C handler")?;

    let mut store = FrameStore::create(&cfg.image_dir, cfg.retention)?;
    let camera = Camera::open(&cfg.camera).context("Failed to open camera")?;
    let net = TractClassifier::load(&cfg.model_path, INPUT_SHAPE)
        .with_context(|| format!("Failed to load classifier {:?}", cfg.model_path))?;

    let stdout = std::io::stdout();
    let summary = classify_loop::run(camera, &net, &mut store, &cfg, &shutdown, &mut stdout.lock())?;
    log::info!("classified {} frames into {}", summary.frames, store.dir().display());
    Ok(())
}
