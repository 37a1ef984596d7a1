use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub const PLACEHOLDER_WIDTH: u32 = 640;
pub const PLACEHOLDER_HEIGHT: u32 = 480;

/// Microseconds since the Unix epoch
pub fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// One captured raster with its capture time
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,

    /// Monotonic capture instant, used for all interval math
    pub captured_at: Instant,

    /// Wall-clock capture time in microseconds since epoch
    pub timestamp_us: u64,

    /// Sequential frame number assigned by the source
    pub sequence_id: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence_id: u64) -> Self {
        Self::captured(image, sequence_id, Instant::now())
    }

    pub fn captured(image: RgbImage, sequence_id: u64, captured_at: Instant) -> Self {
        Self {
            image,
            captured_at,
            timestamp_us: now_us(),
            sequence_id,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<EncodedFrame> {
        let bytes = encode_jpeg(&self.image, quality)?;
        Ok(EncodedFrame {
            bytes,
            sequence_id: self.sequence_id,
            timestamp_us: self.timestamp_us,
            placeholder: false,
        })
    }
}

/// JPEG bytes handed to stream readers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub sequence_id: u64,
    pub timestamp_us: u64,
    pub placeholder: bool,
}

impl EncodedFrame {
    pub fn placeholder(bytes: Vec<u8>, sequence_id: u64) -> Self {
        Self {
            bytes,
            sequence_id,
            timestamp_us: now_us(),
            placeholder: true,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode_image(image)
        .context("Failed to encode frame as JPEG")?;
    Ok(bytes)
}

/// Static "feed offline" card shown while no live frame is available
pub fn offline_placeholder() -> RgbImage {
    let mut image = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, Rgb([16, 16, 16]));

    let border = Rect::at(8, 8).of_size(PLACEHOLDER_WIDTH - 16, PLACEHOLDER_HEIGHT - 16);
    draw_hollow_rect_mut(&mut image, border, Rgb([180, 30, 30]));

    // Center band where a "FEED OFFLINE" label would sit
    let band = Rect::at(120, 220).of_size(PLACEHOLDER_WIDTH - 240, 40);
    draw_filled_rect_mut(&mut image, band, Rgb([200, 200, 200]));

    image
}
