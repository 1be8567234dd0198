//! Live capture core: session, controller, and frame delivery.
//!
//! This module provides the crate's real state and concurrency:
//! - Session lifecycle and device switching via [`CaptureController`]
//! - Configuration transactions via [`CaptureSession`]
//! - Frame delivery to a [`FrameObserver`] on a dedicated thread

mod controller;
mod delivery;
mod frame_utils;
mod session;
mod types;
mod worker;

pub use controller::CaptureController;
pub use session::{CaptureSession, ConfigurationGuard, FrameOutput};
pub use types::{
    CaptureError, Frame, FrameFormat, FrameObserver, OutputFormat, FRAME_ROTATION_DEGREES,
};
