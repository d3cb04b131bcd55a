//! Frame ingestion sources.
//!
//! This module provides the sources a detection cycle pulls frames from:
//! - Synthetic source (`stub://`), for tests and headless demos
//! - Local image directories (feature: ingest-image)
//!
//! Every source reports readiness before a cycle asks it for a frame; a
//! source that is not ready makes the cycle skip without calling the
//! detector.

#[cfg(feature = "ingest-image")]
pub mod image_dir;
pub mod synthetic;

#[cfg(feature = "ingest-image")]
pub use image_dir::ImageDirSource;
pub use synthetic::SyntheticSource;

use anyhow::{anyhow, Result};

use crate::frame::RawFrame;

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// A provider of frames on demand.
pub trait FrameSource: Send {
    /// Open the underlying device/stream.
    fn connect(&mut self) -> Result<()>;

    /// True once the source can hand out frames.
    fn is_ready(&self) -> bool;

    /// Capture the next frame.
    fn next_frame(&mut self) -> Result<RawFrame>;

    fn stats(&self) -> SourceStats;
}

/// Open a source from a URL or directory path.
///
/// `stub://<name>` yields a synthetic source; any other value is a local
/// directory of images (requires the ingest-image feature).
pub fn open_source(location: &str, width: u32, height: u32) -> Result<Box<dyn FrameSource>> {
    if location.trim().is_empty() {
        return Err(anyhow!("frame source must not be empty"));
    }
    if location.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(location, width, height)));
    }
    if location.contains("://") {
        return Err(anyhow!(
            "frame source '{}' is not supported; use stub:// or a local directory",
            location
        ));
    }
    #[cfg(feature = "ingest-image")]
    {
        Ok(Box::new(ImageDirSource::new(location, width, height)?))
    }
    #[cfg(not(feature = "ingest-image"))]
    {
        Err(anyhow!(
            "image directory ingestion requires the ingest-image feature"
        ))
    }
}
