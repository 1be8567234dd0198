//! Frame decoding and stamping.

use std::time::Instant;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::Buffer;

use super::types::{Frame, FrameFormat, FRAME_ROTATION_DEGREES};

/// Decode a raw device buffer into a delivered [`Frame`].
///
/// Handles the device's native format (MJPEG, YUYV, NV12, etc.) via
/// nokhwa's built-in decode, which converts to RGB. The timestamp is taken
/// from the monotonic clock at the moment of decoding — the moment the
/// frame becomes deliverable — not from the buffer's own capture time.
///
/// Returns `None` if decoding fails (unsupported format or corrupt data);
/// the caller drops the frame and moves on to the next one.
pub(crate) fn decode_frame(buffer: &Buffer, epoch: Instant) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame {
        data: decoded.into_raw(),
        width: resolution.width(),
        height: resolution.height(),
        format: FrameFormat::Rgb,
        rotation: FRAME_ROTATION_DEGREES,
        timestamp_ms: epoch.elapsed().as_millis() as i64,
    })
}
