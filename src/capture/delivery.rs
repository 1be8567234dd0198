//! Frame delivery pipeline.
//!
//! Frames are produced on the capture worker thread and consumed on a
//! dedicated delivery thread, so a slow observer never blocks the worker
//! from pulling the next frame. The hand-off is the one deliberate
//! concurrency boundary in the crate: a plain mpsc queue, fire-and-forget,
//! with no backpressure signal back to the producer.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};

use super::types::{Frame, FrameObserver};

/// The observer registration shared between the controller (which arms and
/// disarms it) and the delivery thread (which reads it per frame).
///
/// The observer is held weakly: the controller never owns its consumer, so
/// the callback path cannot create an ownership cycle.
type ObserverSlot = Arc<Mutex<Option<Weak<dyn FrameObserver>>>>;

/// Owns the delivery thread and the observer slot.
pub(crate) struct DeliveryPipeline {
    tx: Option<Sender<Frame>>,
    slot: ObserverSlot,
    thread: Option<JoinHandle<()>>,
}

impl DeliveryPipeline {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Frame>();
        let slot: ObserverSlot = Arc::new(Mutex::new(None));
        let dispatch_slot = Arc::clone(&slot);

        let thread = thread::spawn(move || run_delivery_loop(rx, dispatch_slot));

        Self {
            tx: Some(tx),
            slot,
            thread: Some(thread),
        }
    }

    /// Register the observer. Frames enqueued from now on are dispatched to
    /// it (for as long as its strong reference stays alive).
    pub fn arm(&self, observer: Weak<dyn FrameObserver>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(observer);
        }
    }

    /// Detach the observer, synchronously.
    ///
    /// Once this returns, no frame can reach the observer: frames already
    /// queued on the delivery thread find the slot empty at dispatch time
    /// and are dropped.
    pub fn disarm(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }

    /// A producer handle for the capture worker.
    pub fn sender(&self) -> Sender<Frame> {
        self.tx.as_ref().expect("pipeline already shut down").clone()
    }
}

impl Drop for DeliveryPipeline {
    fn drop(&mut self) {
        self.disarm();
        // Closing the channel lets the delivery loop drain and exit
        drop(self.tx.take());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Dispatch queued frames to the registered observer until every producer
/// handle is gone.
fn run_delivery_loop(rx: Receiver<Frame>, slot: ObserverSlot) {
    for frame in rx {
        let observer = slot
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
            .and_then(|weak| weak.upgrade());

        match observer {
            Some(observer) => observer.on_frame(&frame),
            // No observer registered: the frame is simply dropped
            None => log::trace!("dropping frame, no observer registered"),
        }
    }
}
