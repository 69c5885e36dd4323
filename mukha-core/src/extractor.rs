//! Whole-frame colour and texture measures.

use std::collections::BTreeMap;

use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use mukha_utils::{HsvStats, MeanStd, hsv_stats, laplacian_variance, rgb_to_hsv_u8, to_gray};
use serde::{Deserialize, Serialize};

use crate::features::{HsvMeans, RegionName, TextureMetrics};
use crate::regions::RegionCrop;

/// Hysteresis thresholds for the edge detector.
pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Grayscale level at or above which a pixel counts as near-white.
pub const BRIGHT_LEVEL: u8 = 200;

/// Colour and texture summary of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorTexture {
    pub hsv: HsvMeans,
    pub blur: f64,
    pub texture: TextureMetrics,
    pub bright_fraction: f64,
    pub symmetry: f64,
}

/// Computes global HSV, blur, texture, symmetry and brightness statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorTextureExtractor;

impl ColorTextureExtractor {
    pub fn extract(&self, image: &RgbImage) -> ColorTexture {
        let gray = to_gray(image);
        let hsv = hsv_stats(image, None).map(HsvMeans::from).unwrap_or_default();
        ColorTexture {
            hsv,
            blur: laplacian_variance(&gray),
            texture: texture_metrics(image, &gray),
            bright_fraction: bright_fraction(&gray),
            symmetry: symmetry(&gray),
        }
    }

    /// Statistics for every non-empty region.
    pub fn region_stats(
        &self,
        regions: &BTreeMap<RegionName, RegionCrop>,
    ) -> BTreeMap<RegionName, HsvStats> {
        regions
            .iter()
            .filter_map(|(&name, crop)| crop.stats().map(|stats| (name, stats)))
            .collect()
    }
}

/// Grayscale variance, Canny edge density and value-channel spread.
pub fn texture_metrics(image: &RgbImage, gray: &GrayImage) -> TextureMetrics {
    let pixels = gray.len();
    if pixels == 0 {
        return TextureMetrics::default();
    }
    let intensity: MeanStd = gray.pixels().map(|p| p[0] as f64).collect();

    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();

    let value: MeanStd = image
        .pixels()
        .map(|p| rgb_to_hsv_u8(p[0], p[1], p[2])[2] as f64)
        .collect();

    TextureMetrics {
        variance: intensity.variance(),
        edge_density: edge_pixels as f64 / pixels as f64,
        brightness_std: value.std(),
    }
}

/// Fraction of pixels at or above [`BRIGHT_LEVEL`].
pub fn bright_fraction(gray: &GrayImage) -> f64 {
    let total = gray.len();
    if total == 0 {
        return 0.0;
    }
    let bright = gray.pixels().filter(|p| p[0] >= BRIGHT_LEVEL).count();
    bright as f64 / total as f64
}

/// Mean absolute difference between the left half and the mirrored right half.
///
/// Zero for a perfectly mirror-symmetric frame. The centre column of an odd
/// width is ignored.
pub fn symmetry(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    let half = w / 2;
    if half == 0 || h == 0 {
        return 0.0;
    }
    let diffs: MeanStd = (0..h)
        .flat_map(|y| (0..half).map(move |x| (x, y)))
        .map(|(x, y)| {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(w - 1 - x, y)[0];
            left.abs_diff(right) as f64
        })
        .collect();
    diffs.mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn flat_frame_has_no_texture() {
        let image = RgbImage::from_pixel(40, 40, Rgb([120, 90, 70]));
        let out = ColorTextureExtractor.extract(&image);
        assert_eq!(out.blur, 0.0);
        assert_eq!(out.texture.variance, 0.0);
        assert_eq!(out.texture.edge_density, 0.0);
        assert_eq!(out.texture.brightness_std, 0.0);
        assert_eq!(out.symmetry, 0.0);
        assert_eq!(out.bright_fraction, 0.0);
    }

    #[test]
    fn checkerboard_has_edges_and_variance() {
        let image = RgbImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let out = ColorTextureExtractor.extract(&image);
        assert!(out.texture.variance > 16000.0);
        assert!(out.texture.edge_density > 0.0 && out.texture.edge_density <= 1.0);
        assert!((out.texture.brightness_std - 127.5).abs() < 1e-9);
        assert!((out.bright_fraction - 0.5).abs() < 1e-12);
        assert!(out.blur > 0.0);
    }

    #[test]
    fn symmetry_measures_mirror_difference() {
        let symmetric = GrayImage::from_fn(6, 2, |x, _| Luma([[10, 20, 30, 30, 20, 10][x as usize]]));
        assert_eq!(symmetry(&symmetric), 0.0);

        let lopsided = GrayImage::from_fn(4, 1, |x, _| Luma([if x < 2 { 100 } else { 40 }]));
        assert_eq!(symmetry(&lopsided), 60.0);

        // Odd widths skip the centre column.
        let odd = GrayImage::from_fn(3, 1, |x, _| Luma([[5, 255, 5][x as usize]]));
        assert_eq!(symmetry(&odd), 0.0);
    }

    #[test]
    fn bright_fraction_counts_threshold_inclusive() {
        let gray = GrayImage::from_fn(4, 1, |x, _| Luma([[199, 200, 201, 0][x as usize]]));
        assert_eq!(bright_fraction(&gray), 0.5);
        assert_eq!(bright_fraction(&GrayImage::new(0, 0)), 0.0);
    }

    #[test]
    fn empty_regions_are_left_out() {
        let image = RgbImage::from_pixel(4, 4, Rgb([10, 200, 10]));
        let mut regions = BTreeMap::new();
        regions.insert(RegionName::Chin, RegionCrop::empty());
        regions.insert(
            RegionName::Forehead,
            RegionCrop::from_rect(&image, mukha_utils::PixelRect::new(0, 0, 2, 2)),
        );
        let stats = ColorTextureExtractor.region_stats(&regions);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[&RegionName::Forehead].pixels, 4);
    }
}
