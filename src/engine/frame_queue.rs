use crate::core::EncodedFrame;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// Bounded hand-off of encoded frames from one pipeline to its readers.
///
/// The producer never waits: a push into a full queue drops the new frame.
/// Readers share one queue, so each frame goes to exactly one of them.
pub fn frame_queue(capacity: usize) -> (FrameQueue, FrameReader) {
    let capacity = capacity.max(1);
    let (tx, rx) = bounded(capacity);
    (FrameQueue { tx, capacity }, FrameReader { rx })
}

pub struct FrameQueue {
    tx: Sender<EncodedFrame>,
    capacity: usize,
}

impl FrameQueue {
    /// Returns false if the frame was dropped
    pub fn try_push(&self, frame: EncodedFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            // Every reader is gone; nothing to deliver to
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Clone)]
pub struct FrameReader {
    rx: Receiver<EncodedFrame>,
}

impl FrameReader {
    /// Oldest queued frame, or `None` right away if the queue is empty
    pub fn try_next(&self) -> Option<EncodedFrame> {
        self.rx.try_recv().ok()
    }

    /// Waits at most `timeout` for a frame
    pub fn next_timeout(&self, timeout: Duration) -> Option<EncodedFrame> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
