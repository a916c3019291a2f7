//! zerberus‑preprocess – orient, resize + normalize RGB frames into CHW tensors.

use ndarray::Array3;
use resize::{new, Pixel, Type};
use rgb::FromSlice;
use thiserror::Error;
use zerberus_camera::Frame;

/// Classifier input resolution: 72 rows × 128 columns.
pub const TARGET_HEIGHT: u32 = 72;
pub const TARGET_WIDTH: u32 = 128;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Resize failed: {0}")]
    Resize(#[from] resize::Error),
    #[error("Expected 3 channels, got {0}")]
    Channels(usize),
    #[error("Empty frame ({0}x{1})")]
    Empty(u32, u32),
}

pub type Result<T> = std::result::Result<T, PreprocessError>;

/// Per-channel `(x - mean) / std`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Normalize {
    /// Maps `[0, 1]` onto `[-1, 1]`.
    fn default() -> Self {
        Self { mean: [0.5; 3], std: [0.5; 3] }
    }
}

/// The sensor is mounted upside down and mirrored: vertical then horizontal flip.
pub fn correct_orientation(frame: Frame) -> Frame {
    frame.flip_vertical().flip_horizontal()
}

#[derive(Clone)]
pub struct Preprocessor {
    dst_w: u32,
    dst_h: u32,
    norm: Normalize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(TARGET_WIDTH, TARGET_HEIGHT)
    }
}

impl Preprocessor {
    /// Create a pre‑processor that outputs a (3, H, W) f32 tensor.
    pub fn new(dst_w: u32, dst_h: u32) -> Self {
        Self { dst_w, dst_h, norm: Normalize::default() }
    }

    pub fn with_normalize(mut self, norm: Normalize) -> Self {
        self.norm = norm;
        self
    }

    /// Output shape `(channels, rows, cols)`.
    pub fn output_shape(&self) -> (usize, usize, usize) {
        (3, self.dst_h as usize, self.dst_w as usize)
    }

    /// CPU path: stretch to the target size, scale to 0‑1, normalize, CHW.
    pub fn run(&self, frame: &Frame) -> Result<Array3<f32>> {
        if frame.channels() != 3 {
            return Err(PreprocessError::Channels(frame.channels()));
        }
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        if w == 0 || h == 0 {
            return Err(PreprocessError::Empty(frame.width(), frame.height()));
        }

        // 1. packed RGB in logical order (flips may have reversed strides)
        let rgb = frame.to_rgb_bytes();

        // 2. Resize to dst size with a triangle (bilinear) filter, no crop
        let mut dst = vec![0u8; (self.dst_w * self.dst_h * 3) as usize];
        let mut resizer = new(
            w,
            h,
            self.dst_w as usize,
            self.dst_h as usize,
            Pixel::RGB8,
            Type::Triangle,
        )?;
        resizer.resize(rgb.as_rgb(), dst.as_rgb_mut())?;

        // 3. HWC u8 → CHW normalized f32
        let Normalize { mean, std } = self.norm;
        let (dw, dh) = (self.dst_w as usize, self.dst_h as usize);
        let arr = Array3::<f32>::from_shape_fn((3, dh, dw), |(c, y, x)| {
            let px = dst[(y * dw + x) * 3 + c] as f32 / 255.0;
            (px - mean[c]) / std[c]
        });
        log::trace!("preprocessed {w}x{h} → {:?}", arr.shape());
        Ok(arr)
    }
}
