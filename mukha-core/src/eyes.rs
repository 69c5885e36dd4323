//! Sclera colour scan and under-eye checks.
//!
//! Eye boxes come from the configured [`crate::regions::RegionExtractor`]. Each
//! box is scanned for a yellow sclera tint, and a fixed-height band directly
//! below it is scanned for dark circles, redness and puffiness. With no eye
//! boxes every output keeps its neutral value.

use image::RgbImage;
use log::debug;
use mukha_utils::{PixelRect, channel_means, gray_stats, hsv_stats};

use crate::features::{EyeFlags, JaundiceScan};

/// Open hue interval (OpenCV units) of a jaundiced sclera.
pub const JAUNDICE_HUE: (f64, f64) = (18.0, 45.0);
pub const JAUNDICE_MIN_SATURATION: f64 = 70.0;
pub const JAUNDICE_MIN_VALUE: f64 = 120.0;

pub const DARK_CIRCLE_MAX_BRIGHTNESS: f64 = 80.0;
pub const REDNESS_RED_OVER_GREEN: f64 = 15.0;
pub const PUFFINESS_MAX_STD: f64 = 18.0;
pub const PUFFINESS_MIN_BRIGHTNESS: f64 = 110.0;

/// Default height of the under-eye band in pixels.
pub const DEFAULT_UNDER_EYE_BAND: u32 = 20;

/// Detects eye-derived signals from a frame and its eye boxes.
#[derive(Debug, Clone, Copy)]
pub struct EyeFeatureDetector {
    under_eye_band: u32,
}

impl Default for EyeFeatureDetector {
    fn default() -> Self {
        Self::new(DEFAULT_UNDER_EYE_BAND)
    }
}

impl EyeFeatureDetector {
    pub fn new(under_eye_band: u32) -> Self {
        Self { under_eye_band }
    }

    /// Count eyes whose mean hue, saturation and value match a yellow sclera.
    pub fn scan_jaundice(&self, image: &RgbImage, eyes: &[PixelRect]) -> JaundiceScan {
        let score = eyes
            .iter()
            .filter(|rect| {
                let crop = crop(image, rect);
                match hsv_stats(&crop, None) {
                    Some(stats) => is_jaundiced(stats.mean_h, stats.mean_s, stats.mean_v),
                    None => false,
                }
            })
            .count() as u32;
        if score > 0 {
            debug!("jaundice scan matched {score} eye(s)");
        }
        JaundiceScan::from_score(score)
    }

    /// The band of `under_eye_band` rows directly below an eye box, clipped to the frame.
    pub fn under_eye_rect(&self, eye: &PixelRect, width: u32, height: u32) -> PixelRect {
        PixelRect::new(eye.x, eye.bottom(), eye.width, self.under_eye_band).clip(width, height)
    }

    /// Dark circle, redness and puffiness flags, OR-combined across eyes.
    pub fn under_eye_flags(&self, image: &RgbImage, eyes: &[PixelRect]) -> EyeFlags {
        let (w, h) = image.dimensions();
        let mut flags = EyeFlags::default();
        for eye in eyes {
            let band = self.under_eye_rect(eye, w, h);
            if band.is_empty() {
                continue;
            }
            let strip = crop(image, &band);
            let eye_flags = band_flags(&strip);
            flags.dark_circles |= eye_flags.dark_circles;
            flags.redness |= eye_flags.redness;
            flags.puffiness |= eye_flags.puffiness;
        }
        flags
    }
}

/// Jaundice predicate over mean sclera HSV (OpenCV units).
pub fn is_jaundiced(hue: f64, saturation: f64, value: f64) -> bool {
    hue > JAUNDICE_HUE.0
        && hue < JAUNDICE_HUE.1
        && saturation > JAUNDICE_MIN_SATURATION
        && value > JAUNDICE_MIN_VALUE
}

fn band_flags(strip: &RgbImage) -> EyeFlags {
    let gray = gray_stats(strip, None);
    if gray.count() == 0 {
        return EyeFlags::default();
    }
    let brightness = gray.mean();
    let redness = channel_means(strip, None)
        .is_some_and(|[r, g, _]| r > g + REDNESS_RED_OVER_GREEN);
    EyeFlags {
        dark_circles: brightness < DARK_CIRCLE_MAX_BRIGHTNESS,
        redness,
        puffiness: gray.std() < PUFFINESS_MAX_STD && brightness > PUFFINESS_MIN_BRIGHTNESS,
    }
}

fn crop(image: &RgbImage, rect: &PixelRect) -> RgbImage {
    let rect = rect.clip(image.width(), image.height());
    image::imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use mukha_utils::hsv_u8_to_rgb;

    fn patch_frame(eye_color: [u8; 3], under_color: [u8; 3]) -> (RgbImage, Vec<PixelRect>) {
        let mut image = RgbImage::from_pixel(100, 60, Rgb([128, 128, 128]));
        let eyes = vec![PixelRect::new(10, 10, 20, 10), PixelRect::new(60, 10, 20, 10)];
        for eye in &eyes {
            for y in eye.y..eye.bottom() {
                for x in eye.x..eye.right() {
                    image.put_pixel(x, y, Rgb(eye_color));
                }
            }
            for y in eye.bottom()..eye.bottom() + 20 {
                for x in eye.x..eye.right() {
                    image.put_pixel(x, y, Rgb(under_color));
                }
            }
        }
        (image, eyes)
    }

    #[test]
    fn yellow_sclera_is_detected() {
        let (image, eyes) = patch_frame(hsv_u8_to_rgb(30, 90, 150), [128, 128, 128]);
        let scan = EyeFeatureDetector::default().scan_jaundice(&image, &eyes);
        assert!(scan.detected);
        assert_eq!(scan.score, 2);
    }

    #[test]
    fn green_hue_is_never_jaundice() {
        for (s, v) in [(90u8, 150u8), (200, 250), (255, 255)] {
            let (image, eyes) = patch_frame(hsv_u8_to_rgb(60, s, v), [128, 128, 128]);
            let scan = EyeFeatureDetector::default().scan_jaundice(&image, &eyes);
            assert!(!scan.detected, "s={s} v={v}");
            assert_eq!(scan.score, 0);
        }
    }

    #[test]
    fn predicate_bounds_are_exclusive() {
        assert!(!is_jaundiced(18.0, 90.0, 150.0));
        assert!(!is_jaundiced(45.0, 90.0, 150.0));
        assert!(!is_jaundiced(30.0, 70.0, 150.0));
        assert!(!is_jaundiced(30.0, 90.0, 120.0));
        assert!(is_jaundiced(18.5, 70.5, 120.5));
    }

    #[test]
    fn no_eyes_means_neutral_defaults() {
        let image = RgbImage::from_pixel(40, 40, Rgb([20, 20, 20]));
        let detector = EyeFeatureDetector::default();
        assert_eq!(detector.scan_jaundice(&image, &[]), JaundiceScan::default());
        assert_eq!(detector.under_eye_flags(&image, &[]), EyeFlags::default());
    }

    #[test]
    fn dark_band_flags_dark_circles_only() {
        let (image, eyes) = patch_frame([200, 200, 200], [50, 50, 50]);
        let flags = EyeFeatureDetector::default().under_eye_flags(&image, &eyes);
        assert!(flags.dark_circles);
        assert!(!flags.redness);
        assert!(!flags.puffiness);
    }

    #[test]
    fn flat_bright_reddish_band_is_puffy_and_red() {
        let (image, eyes) = patch_frame([200, 200, 200], [190, 150, 140]);
        let flags = EyeFeatureDetector::default().under_eye_flags(&image, &eyes);
        assert!(!flags.dark_circles);
        assert!(flags.redness);
        assert!(flags.puffiness);
    }

    #[test]
    fn band_below_frame_edge_is_skipped() {
        let image = RgbImage::from_pixel(30, 30, Rgb([10, 10, 10]));
        let eyes = [PixelRect::new(5, 20, 10, 10)];
        let flags = EyeFeatureDetector::default().under_eye_flags(&image, &eyes);
        assert_eq!(flags, EyeFlags::default());
    }

    #[test]
    fn band_is_clipped_to_frame() {
        let detector = EyeFeatureDetector::new(20);
        let band = detector.under_eye_rect(&PixelRect::new(5, 10, 10, 10), 30, 30);
        assert_eq!(band, PixelRect::new(5, 20, 10, 10));
    }
}
