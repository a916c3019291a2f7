//! # zerberus-vision
//!
//! The two camera programs of the Zerberus robot, as library loops:
//!
//! - [`classify_loop`]: capture a frame, persist it as `<n>.png`, read it
//!   back, preprocess it to a `1×3×72×128` tensor and classify it, printing
//!   capture and inference latency every iteration.
//! - [`benchmark`]: time how long `n` captures take on the night exposure
//!   profile.
//!
//! Both are single threaded and synchronous. They take the camera by
//! value so it is released however they return, and they poll a
//! [`Shutdown`] token so Ctrl-C ends them cleanly.

pub mod benchmark;
pub mod classify_loop;
mod error;
mod shutdown;
pub mod store;

pub use error::{Result, VisionError};
pub use shutdown::Shutdown;
