//! Capture session state and configuration transactions.
//!
//! A [`CaptureSession`] aggregates zero-or-one attached input device and
//! exactly one frame output. It lives on the capture worker thread for its
//! whole life (the underlying device handle is not `Send`), which is the
//! only synchronization its state needs. Input changes happen inside a
//! [`ConfigurationGuard`] bracket; the guard borrows the session mutably,
//! so the borrow checker rules out concurrent mutation.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType, Resolution,
};
use nokhwa::{Buffer, Camera};

use super::types::{CaptureError, OutputFormat};
use crate::registry::DeviceHandle;

/// The session's single frame output.
///
/// Holds the resolution/frame-rate preset and pixel-format preference,
/// fixed once at session creation. Cameras attached later all stream
/// through this one output configuration.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    format: OutputFormat,
}

impl FrameOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// The capture session: one optional input, one output, and the live
/// hardware stream while running.
pub struct CaptureSession {
    input: Option<DeviceHandle>,
    output: FrameOutput,
    /// Open hardware stream for the attached input, present while running.
    device: Option<Camera>,
    running: bool,
}

impl CaptureSession {
    /// Create a session with its single frame output. No input is attached
    /// yet; `change_input` attaches one inside a configuration transaction.
    pub fn new(output: FrameOutput) -> Self {
        Self {
            input: None,
            output,
            device: None,
            running: false,
        }
    }

    /// The currently attached input device, if any.
    pub fn input(&self) -> Option<&DeviceHandle> {
        self.input.as_ref()
    }

    pub fn output(&self) -> &FrameOutput {
        &self.output
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Open a configuration transaction. Input attachment changes are only
    /// possible through the returned guard.
    pub fn begin_configuration(&mut self) -> ConfigurationGuard<'_> {
        ConfigurationGuard { session: self }
    }

    /// Swap the attached input to `target`, if it differs from the current
    /// one.
    ///
    /// When the current input already refers to the same device identity
    /// this is a no-op and returns `false` — redundant reconfiguration is
    /// success-without-change. Otherwise the previous input is removed and
    /// the new one added inside a single transaction; returns `true`.
    pub fn change_input(&mut self, target: DeviceHandle) -> bool {
        if self
            .input
            .as_ref()
            .is_some_and(|current| current.unique_id == target.unique_id)
        {
            log::debug!("input already attached to {}; skipping swap", target);
            return false;
        }

        let mut txn = self.begin_configuration();
        txn.remove_input();
        if txn.can_add_input() {
            txn.add_input(target);
        }
        txn.commit();
        true
    }

    /// Start the session running.
    ///
    /// Opens the hardware stream for the attached input. A session with no
    /// input still transitions to running — it just produces no frames
    /// until an input is attached. Open failures are logged and leave the
    /// session running without a stream.
    pub fn start_running(&mut self) {
        if self.device.is_none() {
            if let Some(input) = &self.input {
                match open_device(input, self.output.format()) {
                    Ok(device) => self.device = Some(device),
                    Err(e) => log::warn!("could not open {}: {}", input, e),
                }
            }
        }
        self.running = true;
    }

    /// Stop the session and release the hardware stream. Idempotent.
    pub fn stop_running(&mut self) {
        self.close_device();
        self.running = false;
    }

    /// Pull the next raw buffer from the open stream, if any.
    ///
    /// Blocks until the device produces a frame. Read errors yield `None`;
    /// the worker just tries again on the next iteration.
    pub fn read_frame(&mut self) -> Option<Buffer> {
        self.device.as_mut()?.frame().ok()
    }

    fn close_device(&mut self) {
        if let Some(mut device) = self.device.take() {
            let _ = device.stop_stream();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_running();
    }
}

/// A begin/commit configuration bracket.
///
/// Holds the session's mutable borrow for the duration of the transaction,
/// so input changes are atomic from the session's perspective.
pub struct ConfigurationGuard<'a> {
    session: &'a mut CaptureSession,
}

impl ConfigurationGuard<'_> {
    /// Detach the current input (if present), releasing its hardware
    /// stream.
    pub fn remove_input(&mut self) {
        self.session.close_device();
        self.session.input = None;
    }

    /// Whether the session can accept another input. Sessions hold at most
    /// one.
    pub fn can_add_input(&self) -> bool {
        self.session.input.is_none()
    }

    /// Attach `device` as the session's input. Ignored when an input is
    /// already attached; callers check `can_add_input` first.
    pub fn add_input(&mut self, device: DeviceHandle) {
        if self.can_add_input() {
            log::debug!("attaching input {}", device);
            self.session.input = Some(device);
        }
    }

    /// Close the transaction, applying the attachment changes.
    pub fn commit(self) {}
}

/// Open the hardware stream for a device, honoring the output preset.
///
/// Tries format strategies in order of preference:
/// 1. Closest match with NV12 (native on common webcams)
/// 2. Closest match with MJPEG (widely supported)
/// 3. Highest resolution available (let the device decide the format)
fn open_device(input: &DeviceHandle, format: OutputFormat) -> Result<Camera, CaptureError> {
    let index = CameraIndex::Index(input.index);
    let resolution = Resolution::new(format.width, format.height);

    let format_attempts: Vec<RequestedFormat> = vec![
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            resolution,
            NokhwaFrameFormat::NV12,
            format.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            resolution,
            NokhwaFrameFormat::MJPEG,
            format.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    let mut device = None;

    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => {
                device = Some(cam);
                break;
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    let mut device = device.ok_or_else(|| CaptureError::OpenFailed {
        name: input.name.clone(),
        reason: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no format accepted".to_string()),
    })?;

    device
        .open_stream()
        .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(unique_id: &str) -> DeviceHandle {
        DeviceHandle {
            index: 0,
            name: format!("Camera {}", unique_id),
            unique_id: unique_id.to_string(),
        }
    }

    #[test]
    fn test_new_session_has_no_input_and_is_stopped() {
        let session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        assert!(session.input().is_none());
        assert!(!session.is_running());
    }

    #[test]
    fn test_change_input_attaches_device() {
        let mut session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        assert!(session.change_input(device("a")));
        assert_eq!(session.input().unwrap().unique_id, "a");
    }

    #[test]
    fn test_change_input_same_device_is_noop() {
        // Two starts with the same target must perform at most one
        // reconfiguration
        let mut session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        assert!(session.change_input(device("a")));
        assert!(!session.change_input(device("a")));
        assert_eq!(session.input().unwrap().unique_id, "a");
    }

    #[test]
    fn test_change_input_swaps_devices() {
        let mut session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        assert!(session.change_input(device("a")));
        assert!(session.change_input(device("b")));
        assert_eq!(session.input().unwrap().unique_id, "b");
    }

    #[test]
    fn test_transaction_remove_then_add() {
        let mut session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        session.change_input(device("a"));

        let mut txn = session.begin_configuration();
        assert!(!txn.can_add_input());
        txn.remove_input();
        assert!(txn.can_add_input());
        txn.add_input(device("b"));
        txn.commit();

        assert_eq!(session.input().unwrap().unique_id, "b");
    }

    #[test]
    fn test_add_input_ignored_when_occupied() {
        let mut session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        session.change_input(device("a"));

        let mut txn = session.begin_configuration();
        txn.add_input(device("b"));
        txn.commit();

        // The occupied slot wins; sessions hold at most one input
        assert_eq!(session.input().unwrap().unique_id, "a");
    }

    #[test]
    fn test_stop_running_is_idempotent() {
        let mut session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        session.stop_running();
        session.stop_running();
        assert!(!session.is_running());
    }

    #[test]
    fn test_read_frame_without_stream_returns_none() {
        let mut session = CaptureSession::new(FrameOutput::new(OutputFormat::default()));
        assert!(session.read_frame().is_none());
    }
}
