//! Camera frames handed from a frame source to a detector backend.
//!
//! - `RawFrame`: packed RGB8 pixels plus dimensions.
//!
//! Frames live for exactly one detection cycle; nothing in the crate keeps a
//! frame after the detector call returns.

use anyhow::{anyhow, Result};

/// Packed RGB8 frame (`width * height * 3` bytes, row-major).
pub struct RawFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// All-black frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_mismatched_length() {
        assert!(RawFrame::new(vec![0u8; 11], 2, 2).is_err());
        let frame = RawFrame::new(vec![7u8; 12], 2, 2).unwrap();
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.pixels().len(), 12);
    }

    #[test]
    fn blank_frame_has_rgb_size() {
        let frame = RawFrame::blank(640, 480);
        assert_eq!(frame.pixels().len(), 640 * 480 * 3);
        assert!(format!("{:?}", frame).contains("640"));
    }
}
