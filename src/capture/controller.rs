//! Capture controller: the public control surface.
//!
//! The controller owns the capture worker thread, the delivery thread, and
//! the logical camera selection. Its methods never block on hardware and
//! never surface errors: commands are posted to the worker and take effect
//! eventually; invalid preconditions degrade to no-ops inside the worker.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::delivery::DeliveryPipeline;
use super::types::{FrameObserver, OutputFormat};
use super::worker::{self, Command};
use crate::camera::LogicalCamera;
use crate::preview::{PreviewLayer, PreviewSurface};

/// Logical state guarded by the selection lock.
struct Selection {
    camera: LogicalCamera,
    running: bool,
}

/// Owns a capture session and streams its frames to an observer and a
/// preview surface.
///
/// The observer is held weakly — the controller never keeps its consumer
/// alive. Dropping the controller stops the session and joins both worker
/// threads; no frame is delivered after teardown begins.
pub struct CaptureController {
    /// In-flight-command guard: held across each public control call so
    /// overlapping start/stop/switch calls from different threads cannot
    /// interleave into an inconsistent camera selection.
    selection: Mutex<Selection>,
    observer: Weak<dyn FrameObserver>,
    delivery: DeliveryPipeline,
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureController {
    /// Create the controller, its capture session, and both worker
    /// threads, and insert the live preview layer into `surface`.
    ///
    /// The session starts stopped with no input; call
    /// [`start_capture`](Self::start_capture) to attach a device and run.
    pub fn new(
        observer: Weak<dyn FrameObserver>,
        surface: &mut dyn PreviewSurface,
        format: OutputFormat,
    ) -> Self {
        let preview_slot = Arc::new(Mutex::new(None));
        surface.insert_preview_layer(PreviewLayer::new(Arc::clone(&preview_slot)));

        let delivery = DeliveryPipeline::new();
        let frames = delivery.sender();
        let epoch = Instant::now();

        let (tx, rx) = mpsc::channel();
        let worker =
            thread::spawn(move || worker::run_worker(format, rx, frames, preview_slot, epoch));

        Self {
            selection: Mutex::new(Selection {
                camera: LogicalCamera::default(),
                running: false,
            }),
            observer,
            delivery,
            commands: Some(tx),
            worker: Some(worker),
        }
    }

    /// Start capturing from `camera`.
    ///
    /// Registers the frame observer and posts the start to the capture
    /// worker; the call returns immediately and the hardware start is
    /// eventually-consistent. An unresolvable device leaves the previous
    /// input untouched.
    pub fn start_capture(&self, camera: LogicalCamera) {
        let Ok(mut selection) = self.selection.lock() else {
            return;
        };
        selection.camera = camera;
        self.delivery.arm(self.observer.clone());
        self.post(Command::Start(camera));
        selection.running = true;
    }

    /// Stop capturing. Safe to call when already stopped.
    ///
    /// The observer is detached synchronously — once this returns, no
    /// frame reaches it, even frames already in flight on the delivery
    /// thread — and the hardware stop completes asynchronously afterwards.
    pub fn stop_capture(&self) {
        let Ok(mut selection) = self.selection.lock() else {
            return;
        };
        self.delivery.disarm();
        self.post(Command::Stop);
        selection.running = false;
    }

    /// Switch to the other camera: stop, advance the selection, start.
    ///
    /// The selection lock is held across the whole sequence, so a
    /// concurrent switch or start cannot observe the intermediate state.
    pub fn switch_camera(&self) {
        let Ok(mut selection) = self.selection.lock() else {
            return;
        };
        self.delivery.disarm();
        self.post(Command::Stop);

        selection.camera = selection.camera.next();

        self.delivery.arm(self.observer.clone());
        self.post(Command::Start(selection.camera));
        selection.running = true;
    }

    /// The camera the controller is currently set to.
    pub fn current_camera(&self) -> LogicalCamera {
        self.selection
            .lock()
            .map(|s| s.camera)
            .unwrap_or_default()
    }

    /// Caller-visible run state. The hardware converges to it
    /// asynchronously.
    pub fn is_running(&self) -> bool {
        self.selection.lock().map(|s| s.running).unwrap_or(false)
    }

    fn post(&self, command: Command) {
        if let Some(commands) = &self.commands {
            // A send failure means the worker is already gone and the
            // command is moot
            let _ = commands.send(command);
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        // Detach the observer first so nothing in flight is delivered
        // while the session winds down
        self.delivery.disarm();
        self.post(Command::Stop);

        // Disconnect the command channel; the worker stops the session and
        // exits when it notices
        drop(self.commands.take());
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}
