#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::labels::coco_label;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::RawFrame;

/// Tract-based backend for SSD-style ONNX detectors.
///
/// The model takes a `[1, 3, H, W]` f32 RGB tensor in `0..1` and produces
/// three outputs:
/// - `boxes`   `[1, N, 4]` normalized `ymin, xmin, ymax, xmax`
/// - `scores`  `[1, N]`
/// - `classes` `[1, N]` zero-based COCO class ids
///
/// No thresholding happens here; the post-processing pipeline owns that.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    width: u32,
    height: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
        })
    }

    fn build_input(&self, frame: &RawFrame) -> Result<Tensor> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            ));
        }

        let pixels = frame.pixels();
        let width = self.width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        if outputs.len() < 3 {
            return Err(anyhow!(
                "expected boxes/scores/classes outputs, model produced {}",
                outputs.len()
            ));
        }
        let boxes = outputs[0]
            .to_array_view::<f32>()
            .context("boxes output was not f32")?;
        let scores = outputs[1]
            .to_array_view::<f32>()
            .context("scores output was not f32")?;
        let classes = outputs[2]
            .to_array_view::<f32>()
            .context("classes output was not f32")?;

        let boxes = boxes
            .into_shape((scores.len(), 4))
            .context("boxes output shape is not [1, N, 4]")?;
        let frame_w = self.width as f32;
        let frame_h = self.height as f32;

        let mut detections = Vec::with_capacity(scores.len());
        for (i, (&score, &class)) in scores.iter().zip(classes.iter()).enumerate() {
            if !(score > 0.0) {
                continue;
            }
            let Some(category) = coco_label(class.max(0.0) as usize) else {
                log::debug!("tract: dropping unknown class id {}", class);
                continue;
            };
            let ymin = boxes[[i, 0]].clamp(0.0, 1.0) * frame_h;
            let xmin = boxes[[i, 1]].clamp(0.0, 1.0) * frame_w;
            let ymax = boxes[[i, 2]].clamp(0.0, 1.0) * frame_h;
            let xmax = boxes[[i, 3]].clamp(0.0, 1.0) * frame_w;
            let bbox = BoundingBox::new(
                xmin,
                ymin,
                (xmax - xmin).max(0.0),
                (ymax - ymin).max(0.0),
            );
            detections.push(Detection::new(category, score.min(1.0), bbox)?);
        }
        Ok(detections)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &RawFrame) -> Result<Vec<Detection>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = RawFrame::blank(self.width, self.height);
        self.detect(&blank).map(|_| ())
    }
}
