use anyhow::{anyhow, Result};

use super::{FrameSource, SourceStats};
use crate::frame::RawFrame;

/// Synthetic frame source (`stub://...`).
///
/// Produces moving RGB gradients; the scene shifts every 50 frames.
pub struct SyntheticSource {
    name: String,
    width: u32,
    height: u32,
    connected: bool,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticSource {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            connected: false,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let pixel_count = self.width as usize * self.height as usize * 3;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!("SyntheticSource: connected to {}", self.name);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connected
    }

    fn next_frame(&mut self) -> Result<RawFrame> {
        if !self.connected {
            return Err(anyhow!("{} is not connected", self.name));
        }
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        RawFrame::new(pixels, self.width, self.height)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.name.clone(),
        }
    }
}
