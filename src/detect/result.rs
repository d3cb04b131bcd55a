use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in source-frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Inclusive on all edges.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

/// One labeled region produced by a detector backend.
///
/// Fields are private: a detection is immutable once produced. The only
/// derived form is [`Detection::with_label`], which attaches a display label
/// without touching the category that suppression and capping operate on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    category: String,
    score: f32,
    bbox: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl Detection {
    pub fn new(category: impl Into<String>, score: f32, bbox: BoundingBox) -> Result<Self> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(anyhow!("detection category must not be empty"));
        }
        if !(0.0..=1.0).contains(&score) {
            return Err(anyhow!(
                "detection score {} for '{}' outside 0..=1",
                score,
                category
            ));
        }
        if ![bbox.x, bbox.y, bbox.width, bbox.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(anyhow!(
                "detection box for '{}' is not finite ({}, {}, {}x{})",
                category,
                bbox.x,
                bbox.y,
                bbox.width,
                bbox.height
            ));
        }
        if bbox.width < 0.0 || bbox.height < 0.0 {
            return Err(anyhow!(
                "detection box for '{}' has negative extent ({}x{})",
                category,
                bbox.width,
                bbox.height
            ));
        }
        Ok(Self {
            category,
            score,
            bbox,
            label: None,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Alias label attached by enrichment, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label to show to the learner: the alias when present, else the category.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.category)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
