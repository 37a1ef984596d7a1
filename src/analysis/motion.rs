//! Frame-differencing motion score.
//!
//! absdiff → luma → gaussian blur → binary threshold → dilate, then the
//! fraction of "on" mask pixels scaled by a fixed gain and capped at 1.0.
//! Stateless: the caller owns the previous frame and the temporal smoothing.

use crate::core::Frame;
use crate::error::{Result, SentinelError};
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

/// Intensity a blurred difference pixel must exceed to count as motion
pub const DIFF_THRESHOLD: u8 = 20;
/// Maps typical sensor noise near zero and real motion into [0, 1]
pub const SCORE_GAIN: f64 = 20.0;
/// Sigma of a 5x5 gaussian kernel
const BLUR_SIGMA: f32 = 1.1;
/// Three passes of a 3x3 dilation
const DILATE_RADIUS: u8 = 3;

#[derive(Debug, Clone)]
pub struct MotionScorer {
    threshold: u8,
    gain: f64,
}

impl MotionScorer {
    pub fn new() -> Self {
        Self {
            threshold: DIFF_THRESHOLD,
            gain: SCORE_GAIN,
        }
    }

    /// Score in [0, 1]. Failures report 0.0 so they never read as an anomaly.
    pub fn score(&self, previous: &Frame, current: &Frame) -> f64 {
        match self.try_score(previous, current) {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!(error = %e, "motion scoring failed, reporting 0.0");
                0.0
            }
        }
    }

    pub fn try_score(&self, previous: &Frame, current: &Frame) -> Result<f64> {
        let mask = self.motion_mask(&previous.image, &current.image)?;
        let (w, h) = mask.dimensions();

        let on: u64 = mask.pixels().map(|p| p.0[0] as u64).sum();
        let raw = on as f64 / (w as f64 * h as f64 * 255.0);
        if !raw.is_finite() {
            return Err(SentinelError::scoring(format!("non-finite raw score {}", raw)));
        }

        Ok((raw * self.gain).min(1.0))
    }

    /// Dilated binary motion mask (0 or 255 per pixel)
    pub fn motion_mask(&self, previous: &RgbImage, current: &RgbImage) -> Result<GrayImage> {
        if previous.dimensions() != current.dimensions() {
            return Err(SentinelError::scoring(format!(
                "frame shape mismatch: {:?} vs {:?}",
                previous.dimensions(),
                current.dimensions()
            )));
        }
        let (w, h) = current.dimensions();
        if w == 0 || h == 0 {
            return Err(SentinelError::scoring("empty frame"));
        }

        let diff = luma_difference(previous, current);
        let mut mask = gaussian_blur_f32(&diff, BLUR_SIGMA);
        for pixel in mask.pixels_mut() {
            pixel.0[0] = if pixel.0[0] > self.threshold { 255 } else { 0 };
        }

        Ok(dilate(&mask, Norm::LInf, DILATE_RADIUS))
    }
}

impl Default for MotionScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-channel absolute difference collapsed to BT.601 luma
fn luma_difference(previous: &RgbImage, current: &RgbImage) -> GrayImage {
    let (w, h) = current.dimensions();
    let mut out = GrayImage::new(w, h);
    for ((a, b), o) in previous
        .pixels()
        .zip(current.pixels())
        .zip(out.pixels_mut())
    {
        let dr = a.0[0].abs_diff(b.0[0]) as f32;
        let dg = a.0[1].abs_diff(b.0[1]) as f32;
        let db = a.0[2].abs_diff(b.0[2]) as f32;
        let y = 0.299 * dr + 0.587 * dg + 0.114 * db;
        *o = Luma([y.round().min(255.0) as u8]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame(image: RgbImage) -> Frame {
        Frame::new(image, 0)
    }

    #[test]
    fn test_identical_frames_score_zero() {
        let a = frame(RgbImage::from_pixel(64, 48, Rgb([90, 90, 90])));
        let b = a.clone();
        assert_eq!(MotionScorer::new().score(&a, &b), 0.0);
    }

    #[test]
    fn test_large_change_saturates() {
        let a = frame(RgbImage::from_pixel(64, 48, Rgb([0, 0, 0])));
        let mut img = RgbImage::from_pixel(64, 48, Rgb([0, 0, 0]));
        for x in 0..32 {
            for y in 0..24 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let b = frame(img);
        assert_eq!(MotionScorer::new().score(&a, &b), 1.0);
    }

    #[test]
    fn test_faint_noise_is_ignored() {
        let a = frame(RgbImage::from_pixel(64, 48, Rgb([100, 100, 100])));
        let b = frame(RgbImage::from_pixel(64, 48, Rgb([110, 110, 110])));
        assert_eq!(MotionScorer::new().score(&a, &b), 0.0);
    }

    #[test]
    fn test_shape_mismatch_scores_zero() {
        let a = frame(RgbImage::new(64, 48));
        let b = frame(RgbImage::new(32, 24));
        let scorer = MotionScorer::new();

        assert!(matches!(
            scorer.try_score(&a, &b),
            Err(SentinelError::ScoringFailure(_))
        ));
        assert_eq!(scorer.score(&a, &b), 0.0);
    }

    #[test]
    fn test_small_change_scales_with_gain() {
        // One bright 2x2 spot on a 100x100 frame: dilation grows it, gain
        // lifts it, but it stays well under the cap
        let a = frame(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
        let mut img = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        for x in 50..52 {
            for y in 50..52 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let score = MotionScorer::new().score(&a, &frame(img));
        assert!(score > 0.0 && score < 1.0, "score was {}", score);
    }
}
