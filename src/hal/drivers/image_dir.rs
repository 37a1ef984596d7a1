//! Replays a directory of still images as a live feed.
//!
//! Files are read in lexical order and the sequence loops. The listing is
//! taken at open time, so files added later are picked up on the next
//! reconnect.

use crate::core::Frame;
use crate::error::{Result, SentinelError};
use crate::hal::{FrameSource, SourceDriver, SourceUri};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

pub struct ImageDirDriver;

impl ImageDirDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageDirDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[async_trait]
impl SourceDriver for ImageDirDriver {
    fn driver_id(&self) -> &str {
        "image-dir"
    }

    fn accepts(&self, uri: &SourceUri) -> bool {
        uri.scheme == "file"
    }

    async fn open(&self, uri: &SourceUri) -> Result<Box<dyn FrameSource>> {
        let dir = PathBuf::from(&uri.target);
        let listing = dir.clone();
        let files = tokio::task::spawn_blocking(move || list_images(&listing))
            .await
            .map_err(|e| SentinelError::device_unavailable(format!("listing task failed: {}", e)))?
            .map_err(|e| {
                SentinelError::device_unavailable(format!("{}: {}", dir.display(), e))
            })?;

        if files.is_empty() {
            return Err(SentinelError::device_unavailable(format!(
                "{} contains no images",
                dir.display()
            )));
        }

        tracing::debug!(dir = %dir.display(), count = files.len(), "opened image directory");

        Ok(Box::new(ImageDirSource {
            files,
            cursor: 0,
            sequence: 0,
            open: true,
        }))
    }
}

pub struct ImageDirSource {
    files: Vec<PathBuf>,
    cursor: usize,
    sequence: u64,
    open: bool,
}

#[async_trait]
impl FrameSource for ImageDirSource {
    async fn read(&mut self) -> Result<Frame> {
        if !self.open {
            return Err(SentinelError::read_failed("handle closed"));
        }

        let path = self.files[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.files.len();

        let decoded = tokio::task::spawn_blocking(move || {
            image::open(&path)
                .map(|img| img.to_rgb8())
                .map_err(|e| format!("{}: {}", path.display(), e))
        })
        .await
        .map_err(|e| SentinelError::read_failed(format!("decode task failed: {}", e)))?
        .map_err(SentinelError::read_failed)?;

        self.sequence += 1;
        Ok(Frame::new(decoded, self.sequence))
    }

    async fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_directory_is_unavailable() {
        let driver = ImageDirDriver::new();
        let result = driver
            .open(&SourceUri::parse("/definitely/not/a/frame/dir"))
            .await;
        assert!(matches!(result, Err(SentinelError::DeviceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_reads_in_order_and_loops() {
        let dir = tempdir().unwrap();
        RgbImage::from_pixel(8, 6, Rgb([10, 10, 10]))
            .save(dir.path().join("a.png"))
            .unwrap();
        RgbImage::from_pixel(8, 6, Rgb([200, 200, 200]))
            .save(dir.path().join("b.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let driver = ImageDirDriver::new();
        let uri = SourceUri::parse(dir.path().to_str().unwrap());
        let mut source = driver.open(&uri).await.unwrap();

        let first = source.read().await.unwrap();
        let second = source.read().await.unwrap();
        let third = source.read().await.unwrap();

        assert_eq!(first.image.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(second.image.get_pixel(0, 0), &Rgb([200, 200, 200]));
        assert_eq!(third.image.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(third.sequence_id, 3);

        source.close().await;
        assert!(!source.is_open());
    }
}
