use crate::core::{Detection, Frame};
use anyhow::Result;

/// Object detector plugged into a camera pipeline.
///
/// Only `"person"` detections reach the loitering tracker; a supplied
/// `track_id` is used as-is, otherwise the tracker assigns one. Runs on the
/// tick path, so implementations should return within a tick interval.
pub trait Detector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

impl<F> Detector for F
where
    F: FnMut(&Frame) -> Result<Vec<Detection>> + Send,
{
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        self(frame)
    }
}
