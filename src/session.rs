//! Detection session state.
//!
//! One owned controller holds what a viewer needs between cycles: the
//! committed detections, a human-readable status line and the word the
//! learner selected. The scheduler drives it through a [`SharedSession`].

use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::alias::AliasTable;
use crate::detect::{Detection, SharedBackend};
use crate::ingest::FrameSource;
use crate::postprocess::{postprocess, PostprocessConfig};

/// Height in pixels of the label strip drawn above each box.
pub const LABEL_STRIP_HEIGHT: f32 = 25.0;

pub type SharedSession = Arc<Mutex<DetectionSession>>;

/// Non-fatal cycle errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleError {
    /// No detector is loaded; the detector was not called.
    DetectorUnavailable,
    /// The detector call itself failed.
    DetectionFailure(String),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::DetectorUnavailable => write!(f, "model not loaded"),
            CycleError::DetectionFailure(msg) => write!(f, "detection failed: {}", msg),
        }
    }
}

impl std::error::Error for CycleError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The source had no frame yet; nothing was run.
    FrameNotReady,
    /// Results replaced the current detections.
    Committed(usize),
    /// The run was stopped while detecting; results were dropped.
    Discarded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceBand {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            ConfidenceBand::High
        } else if score >= 0.6 {
            ConfidenceBand::Medium
        } else if score >= 0.4 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
            ConfidenceBand::VeryLow => "very-low",
        }
    }
}

/// Score as a whole percentage.
pub fn percent(score: f32) -> u32 {
    (score * 100.0).round().clamp(0.0, 100.0) as u32
}

pub struct DetectionSession {
    backend: Option<SharedBackend>,
    config: PostprocessConfig,
    aliases: AliasTable,
    detections: Vec<Detection>,
    status: String,
    selected_word: Option<String>,
}

impl DetectionSession {
    pub fn new(backend: Option<SharedBackend>, config: PostprocessConfig, aliases: AliasTable) -> Self {
        let status = if backend.is_some() {
            "model loaded".to_string()
        } else {
            "model not loaded".to_string()
        };
        Self {
            backend,
            config,
            aliases,
            detections: Vec::new(),
            status,
            selected_word: None,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn set_backend(&mut self, backend: SharedBackend) {
        self.backend = Some(backend);
        self.status = "model loaded".to_string();
    }

    /// One detect-and-postprocess cycle.
    ///
    /// `still_running` is consulted after detection; when it returns false
    /// the batch is dropped and the current detections are left alone.
    pub fn run_cycle(
        &mut self,
        source: &mut dyn FrameSource,
        still_running: &dyn Fn() -> bool,
    ) -> Result<CycleOutcome> {
        let Some(backend) = self.backend.clone() else {
            self.status = CycleError::DetectorUnavailable.to_string();
            return Err(CycleError::DetectorUnavailable.into());
        };
        if !source.is_ready() {
            return Ok(CycleOutcome::FrameNotReady);
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                let err = e.context(format!("failed to capture from {}", source.stats().source));
                self.status = format!("capture failed: {:#}", err);
                log::warn!("{}", self.status);
                return Err(err);
            }
        };

        let raw = {
            let mut detector = backend
                .lock()
                .map_err(|_| anyhow!("detector backend lock poisoned"))?;
            detector.detect(&frame)
        };
        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                let err = CycleError::DetectionFailure(format!("{:#}", e));
                self.status = err.to_string();
                log::warn!("{}", err);
                return Err(err.into());
            }
        };

        let raw_len = raw.len();
        let kept = self.aliases.annotate(postprocess(raw, &self.config));

        if !still_running() {
            log::debug!("discarding {} detections from a stopped run", kept.len());
            return Ok(CycleOutcome::Discarded);
        }

        let count = kept.len();
        log::debug!("cycle committed {} of {} raw detections", count, raw_len);
        self.detections = kept;
        self.status = format!("{} objects detected", count);
        Ok(CycleOutcome::Committed(count))
    }

    /// Single manual capture-and-detect.
    pub fn detect_once(&mut self, source: &mut dyn FrameSource) -> Result<CycleOutcome> {
        self.run_cycle(source, &|| true)
    }

    /// Forget current detections, e.g. after the camera stops.
    pub fn clear(&mut self) {
        self.detections.clear();
        self.status = "detection stopped".to_string();
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn config(&self) -> &PostprocessConfig {
        &self.config
    }

    pub fn select_word(&mut self, word: impl Into<String>) {
        self.selected_word = Some(word.into());
    }

    pub fn clear_selection(&mut self) {
        self.selected_word = None;
    }

    pub fn selected_word(&self) -> Option<&str> {
        self.selected_word.as_deref()
    }

    /// Category whose label strip contains `(x, y)`. Later detections are
    /// drawn on top, so the last match wins.
    pub fn hit_test_label(&self, x: f32, y: f32) -> Option<&str> {
        self.detections
            .iter()
            .rev()
            .find(|det| {
                let b = det.bbox();
                x >= b.x && x <= b.x + b.width && y >= b.y - LABEL_STRIP_HEIGHT && y <= b.y
            })
            .map(|det| det.category())
    }

    /// Hit-test and select in one step, as a click on a label does.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<String> {
        let word = self.hit_test_label(x, y)?.to_string();
        self.selected_word = Some(word.clone());
        Some(word)
    }
}
