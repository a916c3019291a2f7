use std::error::Error as StdError;
use thiserror::Error;
use zerberus_camera::CameraError;
use zerberus_classify::ClassifyError;
use zerberus_preprocess::PreprocessError;

/// Every way a capture loop can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Camera device error: {0}")]
    Device(#[source] CameraError),
    #[error("Capture error: {0}")]
    Capture(#[source] CameraError),
    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Interrupted before {0}")]
    Interrupted(&'static str),
    #[error("Inference error: {0}")]
    Inference(#[from] ClassifyError),
    #[error("Preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),
}

pub type Result<T> = std::result::Result<T, VisionError>;

impl VisionError {
    pub fn io(context: impl Into<String>, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Io { context: context.into(), source: source.into() }
    }
}

impl From<CameraError> for VisionError {
    fn from(e: CameraError) -> Self {
        match e {
            CameraError::NoFrame(_) | CameraError::InvalidFrame { .. } | CameraError::MissingBuffer => {
                Self::Capture(e)
            }
            CameraError::Image(_) | CameraError::Io(_) => Self::io("frame file", e),
            _ => Self::Device(e),
        }
    }
}

impl From<std::io::Error> for VisionError {
    fn from(e: std::io::Error) -> Self {
        Self::io("report output", e)
    }
}
