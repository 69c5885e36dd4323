use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::color::{lab_lightness, luma_bt601, rgb_to_hsv_u8};

/// Load an image from disk into memory.
///
/// # Arguments
///
/// * `path` - The path to the image file.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path_ref = path.as_ref();
    image::open(path_ref).with_context(|| format!("failed to open image {}", path_ref.display()))
}

/// Convert an RGB image to grayscale with BT.601 weights.
///
/// `image::DynamicImage::to_luma8` uses Rec. 709 coefficients, which shifts the
/// brightness thresholds used by the eye and texture checks.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let p = image.get_pixel(x, y);
        Luma([luma_bt601(p[0], p[1], p[2])])
    })
}

/// Running mean / population standard deviation accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanStd {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

impl MeanStd {
    #[inline]
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }

    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl FromIterator<f64> for MeanStd {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = MeanStd::default();
        for value in iter {
            acc.push(value);
        }
        acc
    }
}

/// HSV statistics (OpenCV units) over a set of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvStats {
    pub mean_h: f64,
    pub mean_s: f64,
    pub mean_v: f64,
    pub std_v: f64,
    /// Number of pixels that contributed.
    pub pixels: u64,
}

/// Returns `true` when the pixel at `(x, y)` is selected by the optional mask.
#[inline]
fn selected(mask: Option<&GrayImage>, x: u32, y: u32) -> bool {
    mask.is_none_or(|m| m.get_pixel(x, y)[0] > 0)
}

/// Compute HSV statistics over an image, optionally restricted to non-zero mask pixels.
///
/// Returns `None` when no pixel is selected (empty image or empty mask).
pub fn hsv_stats(image: &RgbImage, mask: Option<&GrayImage>) -> Option<HsvStats> {
    let mut h = MeanStd::default();
    let mut s = MeanStd::default();
    let mut v = MeanStd::default();
    for (x, y, p) in image.enumerate_pixels() {
        if !selected(mask, x, y) {
            continue;
        }
        let [ph, ps, pv] = rgb_to_hsv_u8(p[0], p[1], p[2]);
        h.push(ph as f64);
        s.push(ps as f64);
        v.push(pv as f64);
    }
    if v.count() == 0 {
        return None;
    }
    Some(HsvStats {
        mean_h: h.mean(),
        mean_s: s.mean(),
        mean_v: v.mean(),
        std_v: v.std(),
        pixels: v.count(),
    })
}

/// Mean and standard deviation of BT.601 grayscale over the selected pixels.
pub fn gray_stats(image: &RgbImage, mask: Option<&GrayImage>) -> MeanStd {
    image
        .enumerate_pixels()
        .filter(|(x, y, _)| selected(mask, *x, *y))
        .map(|(_, _, p)| luma_bt601(p[0], p[1], p[2]) as f64)
        .collect()
}

/// Per-channel means `[r, g, b]` over the selected pixels.
pub fn channel_means(image: &RgbImage, mask: Option<&GrayImage>) -> Option<[f64; 3]> {
    let mut sums = [0.0f64; 3];
    let mut count = 0u64;
    for (x, y, p) in image.enumerate_pixels() {
        if !selected(mask, x, y) {
            continue;
        }
        sums[0] += p[0] as f64;
        sums[1] += p[1] as f64;
        sums[2] += p[2] as f64;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sums.map(|s| s / count as f64))
}

/// Mean CIELAB lightness (0-255 scale) of the whole image.
pub fn mean_lightness(image: &RgbImage) -> f64 {
    image
        .pixels()
        .map(|p| lab_lightness(p[0], p[1], p[2]) as f64)
        .collect::<MeanStd>()
        .mean()
}
