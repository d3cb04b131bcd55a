//! Local image directory source.
//!
//! Cycles over the still images of a directory as if they were camera
//! frames. Images are decoded in-memory and resized to the configured frame
//! size.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;

use super::{FrameSource, SourceStats};
use crate::frame::RawFrame;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub struct ImageDirSource {
    dir: PathBuf,
    width: u32,
    height: u32,
    files: Vec<PathBuf>,
    cursor: usize,
    frame_count: u64,
}

impl ImageDirSource {
    pub fn new(dir: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }
        Ok(Self {
            dir,
            width,
            height,
            files: Vec::new(),
            cursor: 0,
            frame_count: 0,
        })
    }
}

impl FrameSource for ImageDirSource {
    fn connect(&mut self) -> Result<()> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("read image directory {}", self.dir.display()))?
        {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            log::warn!("ImageDirSource: no images found in {}", self.dir.display());
        } else {
            log::info!(
                "ImageDirSource: {} images in {}",
                files.len(),
                self.dir.display()
            );
        }
        self.files = files;
        self.cursor = 0;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        !self.files.is_empty()
    }

    fn next_frame(&mut self) -> Result<RawFrame> {
        if self.files.is_empty() {
            return Err(anyhow!("no images available in {}", self.dir.display()));
        }
        let path = &self.files[self.cursor % self.files.len()];
        self.cursor = (self.cursor + 1) % self.files.len();
        let img = image::open(path).with_context(|| format!("decode {}", path.display()))?;
        let rgb = img
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgb8();
        self.frame_count += 1;
        RawFrame::new(rgb.into_raw(), self.width, self.height)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.dir.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_over_directory_images() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([200, 10, 10]));
        img.save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageDirSource::new(dir.path(), 4, 4).unwrap();
        assert!(!source.is_ready());
        source.connect().unwrap();
        assert!(source.is_ready());

        let frame = source.next_frame().unwrap();
        assert_eq!(frame.pixels().len(), 4 * 4 * 3);
        assert_eq!(frame.pixels()[0], 200);
        source.next_frame().unwrap();
        assert_eq!(source.stats().frames_captured, 2);
    }
}
