//! Capture worker thread.
//!
//! All session mutation — input attachment, configuration transactions,
//! start and stop — happens here, serialized by command arrival order.
//! Frame production happens here too: while the session runs, the loop
//! pulls raw buffers from the device, decodes them, and hands them off to
//! the delivery thread and the preview slot. There are no locks around the
//! session; this thread owns it outright.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use super::frame_utils::decode_frame;
use super::session::{CaptureSession, FrameOutput};
use super::types::{Frame, OutputFormat};
use crate::camera::LogicalCamera;
use crate::preview::FrameSlot;
use crate::registry;

/// Commands posted from the controller.
pub(crate) enum Command {
    /// Attach the device for this camera and start the session.
    Start(LogicalCamera),
    /// Stop the session and release the device.
    Stop,
}

/// Run the capture worker loop.
///
/// The session is created here, once, because the underlying device handle
/// must live on a single thread. The loop exits when the command channel
/// disconnects — the controller is gone, so the session is stopped and the
/// remaining work abandoned rather than touching shared state that may no
/// longer be wanted.
pub(crate) fn run_worker(
    format: OutputFormat,
    commands: Receiver<Command>,
    frames: Sender<Frame>,
    preview: FrameSlot,
    epoch: Instant,
) {
    let mut session = CaptureSession::new(FrameOutput::new(format));

    loop {
        // Block while stopped; poll between frames while running
        let command = if session.is_running() {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        };

        if let Some(command) = command {
            match command {
                Command::Start(camera) => start(&mut session, camera),
                Command::Stop => session.stop_running(),
            }
            continue;
        }

        pump_one_frame(&mut session, &frames, &preview, epoch);
    }

    session.stop_running();
}

/// Execute a start command: resolve the device fresh, swap the input, run.
fn start(session: &mut CaptureSession, camera: LogicalCamera) {
    // The device list is queried fresh on every start to tolerate devices
    // appearing and disappearing between switches
    match registry::device_at(camera.device_index()) {
        Some(device) => {
            if session.change_input(device) {
                log::info!("capture input set for {} camera", camera);
            }
        }
        None => {
            // Leave the prior input (or lack of one) untouched
            log::warn!("no capture device for {} camera", camera);
        }
    }
    session.start_running();
}

/// Pull, decode, and dispatch a single frame, if one is available.
fn pump_one_frame(
    session: &mut CaptureSession,
    frames: &Sender<Frame>,
    preview: &FrameSlot,
    epoch: Instant,
) {
    let Some(buffer) = session.read_frame() else {
        // Running with no input attached (or the device is not producing):
        // idle instead of spinning
        thread::sleep(Duration::from_millis(50));
        return;
    };

    // Undecodable buffers are dropped here; nothing invalid goes downstream
    if let Some(frame) = decode_frame(&buffer, epoch) {
        if let Ok(mut slot) = preview.lock() {
            *slot = Some(frame.clone());
        }
        // The delivery thread owns dispatch from here; if it is gone the
        // controller is tearing down and the frame is moot
        let _ = frames.send(frame);
    }

    // Small sleep to allow checking for commands between frames
    thread::sleep(Duration::from_millis(1));
}
