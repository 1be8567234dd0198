//! Live preview wiring.
//!
//! The preview shows whatever the active device captures, independent of
//! observer registration. The capture worker overwrites a shared
//! latest-frame slot on every decoded frame; a [`PreviewLayer`] is a cheap
//! handle onto that slot which a UI collaborator polls at its own pace.

use std::sync::{Arc, Mutex};

use crate::capture::Frame;

/// Shared latest-frame cell, written by the capture worker.
pub(crate) type FrameSlot = Arc<Mutex<Option<Frame>>>;

/// A live handle onto the most recent decoded frame.
///
/// Cloning is cheap; all clones observe the same underlying slot.
#[derive(Clone)]
pub struct PreviewLayer {
    slot: FrameSlot,
}

impl PreviewLayer {
    pub(crate) fn new(slot: FrameSlot) -> Self {
        Self { slot }
    }

    /// The most recent frame the session produced, if any.
    ///
    /// Returns `None` before the first frame arrives and keeps returning
    /// the last frame after capture stops.
    pub fn latest_frame(&self) -> Option<Frame> {
        let slot = self.slot.lock().ok()?;
        slot.clone()
    }
}

/// A rendering surface that hosts the live preview.
///
/// The controller inserts a [`PreviewLayer`] exactly once, at construction
/// time. One-shot wiring; there is no further contract.
pub trait PreviewSurface {
    fn insert_preview_layer(&mut self, layer: PreviewLayer);
}
