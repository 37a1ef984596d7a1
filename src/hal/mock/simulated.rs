use crate::core::Frame;
use crate::error::Result;
use crate::hal::{FrameSource, SourceDriver, SourceUri};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Parameters of a synthetic camera, read from `sim://` query keys
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCameraConfig {
    pub width: u32,
    pub height: u32,
    /// Frames between the starts of two activity bursts; 0 disables activity
    pub activity_every: u64,
    /// Frames per activity burst
    pub activity_len: u64,
}

impl Default for SimulatedCameraConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            activity_every: 200,
            activity_len: 100,
        }
    }
}

impl SimulatedCameraConfig {
    pub fn from_uri(uri: &SourceUri) -> Self {
        let defaults = Self::default();
        Self {
            width: uri.param("width").unwrap_or(defaults.width).max(8),
            height: uri.param("height").unwrap_or(defaults.height).max(8),
            activity_every: uri.param("activity_every").unwrap_or(defaults.activity_every),
            activity_len: uri.param("activity_len").unwrap_or(defaults.activity_len),
        }
    }
}

pub struct SimulatedCameraDriver;

impl SimulatedCameraDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimulatedCameraDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceDriver for SimulatedCameraDriver {
    fn driver_id(&self) -> &str {
        "sim"
    }

    fn accepts(&self, uri: &SourceUri) -> bool {
        uri.scheme == "sim"
    }

    async fn open(&self, uri: &SourceUri) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(SimulatedCamera::new(SimulatedCameraConfig::from_uri(uri))))
    }
}

/// Static textured scene; during activity bursts a large bright block
/// sweeps across it, which is enough frame-to-frame change to saturate
/// the motion score.
pub struct SimulatedCamera {
    config: SimulatedCameraConfig,
    background: RgbImage,
    frame_counter: u64,
    open: bool,
}

impl SimulatedCamera {
    pub fn new(config: SimulatedCameraConfig) -> Self {
        let background = RgbImage::from_fn(config.width, config.height, |x, y| {
            let v = (((x / 8) + (y / 8)) % 2 * 24 + 40) as u8;
            Rgb([v, v, v + 8])
        });

        Self {
            config,
            background,
            frame_counter: 0,
            open: true,
        }
    }

    pub fn is_active(&self, frame_index: u64) -> bool {
        self.config.activity_every > 0
            && frame_index % self.config.activity_every < self.config.activity_len
    }

    fn render(&self, frame_index: u64) -> RgbImage {
        let mut image = self.background.clone();
        if self.is_active(frame_index) {
            let block_w = (self.config.width / 3).max(1);
            let block_h = (self.config.height / 2).max(1);
            let travel = (self.config.width - block_w).max(1) as u64;
            // Jump a quarter of the block width each frame
            let step = (block_w as u64 / 4).max(1);
            let x = ((frame_index * step) % travel) as i32;
            let y = (self.config.height / 4) as i32;
            draw_filled_rect_mut(
                &mut image,
                Rect::at(x, y).of_size(block_w, block_h),
                Rgb([250, 250, 250]),
            );
        }
        image
    }
}

#[async_trait]
impl FrameSource for SimulatedCamera {
    async fn read(&mut self) -> Result<Frame> {
        let image = self.render(self.frame_counter);
        self.frame_counter += 1;
        Ok(Frame::new(image, self.frame_counter))
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

    #[test]
    fn test_config_from_uri() {
        let uri = SourceUri::parse("sim://lab?width=64&height=48&activity_every=0");
        let config = SimulatedCameraConfig::from_uri(&uri);

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 48);
        assert_eq!(config.activity_every, 0);
        assert_eq!(config.activity_len, 100);
    }

    #[tokio::test]
    async fn test_idle_frames_are_identical() {
        let mut camera = SimulatedCamera::new(SimulatedCameraConfig {
            width: 32,
            height: 24,
            activity_every: 0,
            activity_len: 0,
        });

        let a = camera.read().await.unwrap();
        let b = camera.read().await.unwrap();
        assert_eq!(a.image, b.image);
        assert_eq!(b.sequence_id, 2);
    }

    #[tokio::test]
    async fn test_active_frames_change() {
        let mut camera = SimulatedCamera::new(SimulatedCameraConfig {
            width: 64,
            height: 48,
            activity_every: 10,
            activity_len: 10,
        });

        let a = camera.read().await.unwrap();
        let b = camera.read().await.unwrap();
        assert_ne!(a.image, b.image);
    }
}
