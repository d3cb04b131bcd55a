use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::RawFrame;

/// Detector backend trait.
///
/// Backends are opaque: the post-processing pipeline only sees the raw
/// detections they return and never assumes a particular model. Each call
/// produces one batch; batches are never merged.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame and return the raw, unfiltered batch.
    ///
    /// Box coordinates are in pixels of `frame`.
    fn detect(&mut self, frame: &RawFrame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
