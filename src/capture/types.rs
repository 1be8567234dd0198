//! Capture types and data structures.

use thiserror::Error;

/// Rotation applied to every delivered frame, in degrees.
///
/// Matches the orientation convention of portrait-mounted camera modules:
/// the sensor scans landscape, so consumers rotate by 90 degrees.
pub const FRAME_ROTATION_DEGREES: i32 = 90;

/// Pixel format of a delivered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A decoded video frame.
///
/// Produced on the capture worker thread and handed to the observer on the
/// delivery thread. The observer borrows the frame for the duration of one
/// callback only; nothing is retained on its behalf afterwards.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Rotation angle in degrees
    pub rotation: i32,
    /// Milliseconds on the monotonic clock at the moment of delivery
    pub timestamp_ms: i64,
}

impl Frame {
    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }
}

/// Consumer of delivered frames.
///
/// `on_frame` is invoked once per frame on the delivery thread. Delivery is
/// fire-and-forget: there is no acknowledgment and no backpressure signal
/// back to the capture pipeline. A long-blocking implementation backs up
/// the delivery queue only; the capture worker keeps pulling frames.
pub trait FrameObserver: Send + Sync {
    fn on_frame(&self, frame: &Frame);
}

/// Resolution and frame-rate preset for the session's frame output.
///
/// Applied once at session creation; it does not change per camera.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// Errors that can occur inside the capture path.
///
/// None of these surface through the control API: the controller degrades
/// to a no-op and logs instead. They are returned by the fallible helpers
/// (`list_devices`, device opening) so the worker can decide what to log.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to query capture devices: {0}")]
    QueryFailed(String),

    #[error("failed to open capture device '{name}': {reason}")]
    OpenFailed { name: String, reason: String },

    #[error("failed to start device stream: {0}")]
    StreamFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bytes_per_pixel() {
        let frame = Frame {
            data: vec![0; 6], // 2 RGB pixels
            width: 2,
            height: 1,
            format: FrameFormat::Rgb,
            rotation: FRAME_ROTATION_DEGREES,
            timestamp_ms: 0,
        };
        assert_eq!(frame.bytes_per_pixel(), 3);
    }

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert_eq!(format.width, 640);
        assert_eq!(format.height, 480);
        assert_eq!(format.fps, 30);
    }

    #[test]
    fn test_capture_error_display() {
        assert_eq!(
            format!("{}", CaptureError::QueryFailed("test".to_string())),
            "failed to query capture devices: test"
        );
        assert_eq!(
            format!(
                "{}",
                CaptureError::OpenFailed {
                    name: "cam".to_string(),
                    reason: "busy".to_string()
                }
            ),
            "failed to open capture device 'cam': busy"
        );
        assert_eq!(
            format!("{}", CaptureError::StreamFailed("test".to_string())),
            "failed to start device stream: test"
        );
    }
}
