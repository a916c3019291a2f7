// zerberus-camera/src/frame.rs
use crate::{CameraError, Result};
use image::RgbImage;
use ndarray::{Array3, Axis};
use std::path::Path;
use std::time::Duration;

/// One captured RGB image, `H×W×3`.
///
/// Flips only reverse the array strides; [`Frame::to_rgb_bytes`] always
/// yields logical row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub pixels: Array3<u8>,
    pub pts: Duration,
}

impl Frame {
    /// Wrap packed RGB24 bytes.
    pub fn from_rgb(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if bytes.is_empty() || bytes.len() != expected {
            return Err(CameraError::InvalidFrame { expected, got: bytes.len() });
        }
        let got = bytes.len();
        let pixels = Array3::from_shape_vec((height as usize, width as usize, 3), bytes)
            .map_err(|_| CameraError::InvalidFrame { expected, got })?;
        Ok(Self { pixels, pts: Duration::ZERO })
    }

    pub fn width(&self) -> u32 {
        self.pixels.shape()[1] as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.shape()[0] as u32
    }

    pub fn channels(&self) -> usize {
        self.pixels.shape()[2]
    }

    /// Upside down.
    pub fn flip_vertical(mut self) -> Self {
        self.pixels.invert_axis(Axis(0));
        self
    }

    /// Mirror.
    pub fn flip_horizontal(mut self) -> Self {
        self.pixels.invert_axis(Axis(1));
        self
    }

    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().copied().collect()
    }

    pub fn to_image(&self) -> Result<RgbImage> {
        let bytes = self.to_rgb_bytes();
        let got = bytes.len();
        RgbImage::from_raw(self.width(), self.height(), bytes)
            .ok_or(CameraError::InvalidFrame { expected: self.pixels.len(), got })
    }

    /// Encode to `path`; the format follows the extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.to_image()?.save(path)?;
        Ok(())
    }

    /// Decode an image file back into a frame (alpha and grey are expanded to RGB).
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)?.to_rgb8();
        let (w, h) = img.dimensions();
        Self::from_rgb(w, h, img.into_raw())
    }
}
