use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::RawFrame;

/// One scripted response of the stub backend.
#[derive(Clone, Debug)]
pub enum StubStep {
    Batch(Vec<Detection>),
    Fail(String),
}

/// Stub backend for tests and demos. Replays a script of batches/failures,
/// cycling back to the start once exhausted. An empty script yields empty
/// batches.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    script: Vec<StubStep>,
    cursor: usize,
    calls: u64,
    delay: Option<Duration>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(script: Vec<StubStep>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn with_batch(mut self, batch: Vec<Detection>) -> Self {
        self.script.push(StubStep::Batch(batch));
        self
    }

    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.script.push(StubStep::Fail(message.into()));
        self
    }

    /// Sleep for `delay` inside every `detect` call (simulates slow inference).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A fixed kitchen scene for 640x480 frames: two overlapping cups, four
    /// chairs, a tv, a low-confidence dog and an undersized spoon.
    pub fn demo() -> Result<Self> {
        let batch = vec![
            Detection::new("cup", 0.91, BoundingBox::new(40.0, 60.0, 90.0, 110.0))?,
            Detection::new("cup", 0.84, BoundingBox::new(46.0, 64.0, 90.0, 110.0))?,
            Detection::new("chair", 0.88, BoundingBox::new(200.0, 200.0, 80.0, 140.0))?,
            Detection::new("chair", 0.79, BoundingBox::new(300.0, 200.0, 80.0, 140.0))?,
            Detection::new("chair", 0.73, BoundingBox::new(400.0, 200.0, 80.0, 140.0))?,
            Detection::new("chair", 0.62, BoundingBox::new(500.0, 200.0, 80.0, 140.0))?,
            Detection::new("tv", 0.67, BoundingBox::new(220.0, 20.0, 160.0, 100.0))?,
            Detection::new("dog", 0.21, BoundingBox::new(100.0, 300.0, 60.0, 60.0))?,
            Detection::new("spoon", 0.55, BoundingBox::new(150.0, 90.0, 12.0, 40.0))?,
        ];
        Ok(Self::new().with_batch(batch))
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &RawFrame) -> Result<Vec<Detection>> {
        self.calls += 1;
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        let step = self.script[self.cursor % self.script.len()].clone();
        self.cursor = (self.cursor + 1) % self.script.len();
        match step {
            StubStep::Batch(batch) => Ok(batch),
            StubStep::Fail(message) => Err(anyhow!("stub detector failure: {}", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_backend_cycles_script() {
        let cup = Detection::new("cup", 0.9, BoundingBox::new(0.0, 0.0, 30.0, 30.0)).unwrap();
        let mut backend = StubBackend::new()
            .with_batch(vec![cup.clone()])
            .with_failure("model crashed");
        let frame = RawFrame::blank(4, 4);

        assert_eq!(backend.detect(&frame).unwrap(), vec![cup.clone()]);
        let err = backend.detect(&frame).unwrap_err();
        assert!(err.to_string().contains("model crashed"));
        assert_eq!(backend.detect(&frame).unwrap(), vec![cup]);
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn empty_script_yields_empty_batches() {
        let mut backend = StubBackend::new();
        let frame = RawFrame::blank(4, 4);
        assert!(backend.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn demo_scene_is_valid() {
        let mut backend = StubBackend::demo().unwrap();
        let batch = backend.detect(&RawFrame::blank(640, 480)).unwrap();
        assert_eq!(batch.len(), 9);
    }
}
