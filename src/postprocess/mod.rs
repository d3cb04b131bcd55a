//! Detection post-processing.
//!
//! Raw detector output goes through a fixed sequence of stages:
//!
//! 1. `filter`: confidence floor and minimum box extent
//! 2. `nms`: greedy highest-score-first suppression of overlapping boxes
//! 3. `cap`: at most N detections per category
//! 4. final stable sort by descending score
//!
//! The order is part of the contract. Capping relies on the score-descending
//! order produced by suppression, and suppression runs on the already
//! filtered (bounded) set.

pub mod cap;
pub mod filter;
pub mod nms;
pub mod overlap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::detect::Detection;

pub use cap::cap_per_category;
pub use filter::filter_detections;
pub use nms::{sort_by_score, suppress};
pub use overlap::iou;

pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.4;
pub const DEFAULT_MIN_EXTENT: f32 = 20.0;
pub const DEFAULT_OVERLAP_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_PER_CATEGORY: usize = 3;

/// Thresholds for [`postprocess`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostprocessConfig {
    /// Minimum score to keep (inclusive).
    pub confidence_floor: f32,
    /// Width and height must both exceed this many pixels.
    pub min_extent: f32,
    /// Overlap at or above which the lower-scoring box is suppressed.
    pub overlap_threshold: f32,
    pub max_per_category: usize,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            min_extent: DEFAULT_MIN_EXTENT,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            max_per_category: DEFAULT_MAX_PER_CATEGORY,
        }
    }
}

impl PostprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(anyhow!(
                "confidence_floor must be within 0..=1 (got {})",
                self.confidence_floor
            ));
        }
        if !self.min_extent.is_finite() || self.min_extent < 0.0 {
            return Err(anyhow!(
                "min_extent must be a non-negative number of pixels (got {})",
                self.min_extent
            ));
        }
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(anyhow!(
                "overlap_threshold must be within 0..=1 (got {})",
                self.overlap_threshold
            ));
        }
        Ok(())
    }
}

/// Run the full pipeline over one raw batch.
pub fn postprocess(raw: Vec<Detection>, config: &PostprocessConfig) -> Vec<Detection> {
    let raw_len = raw.len();
    let filtered = filter_detections(raw, config.confidence_floor, config.min_extent);
    let filtered_len = filtered.len();
    let suppressed = suppress(filtered, config.overlap_threshold);
    let suppressed_len = suppressed.len();
    let mut capped = cap_per_category(suppressed, config.max_per_category);
    sort_by_score(&mut capped);
    log::trace!(
        "postprocess: raw={} filtered={} suppressed={} capped={}",
        raw_len,
        filtered_len,
        suppressed_len,
        capped.len()
    );
    capped
}
