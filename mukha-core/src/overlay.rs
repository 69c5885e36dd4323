//! Diagnostic overlay: tinted regions and outlined eye boxes.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use mukha_utils::PixelRect;

use crate::analyzer::FaceAnalysis;
use crate::features::RegionName;

/// Blend weight of the tint colour.
pub const TINT_ALPHA: f32 = 0.35;

const EYE_OK: Rgb<u8> = Rgb([0, 200, 0]);
const EYE_JAUNDICE: Rgb<u8> = Rgb([255, 200, 0]);

/// Tint colour used for a region.
pub fn region_color(name: RegionName) -> Rgb<u8> {
    match name {
        RegionName::Forehead => Rgb([255, 170, 0]),
        RegionName::Cheeks | RegionName::LeftCheek | RegionName::RightCheek => Rgb([255, 60, 90]),
        RegionName::Chin => Rgb([60, 140, 255]),
        RegionName::LeftEye | RegionName::RightEye => Rgb([0, 220, 220]),
        RegionName::UnderEyeLeft | RegionName::UnderEyeRight => Rgb([150, 80, 255]),
    }
}

/// Alpha-blend `color` over the pixels of `rect`.
///
/// When a mask is given (in `rect` coordinates) only its non-zero pixels are tinted.
pub fn tint_region(
    image: &mut RgbImage,
    rect: &PixelRect,
    mask: Option<&GrayImage>,
    color: Rgb<u8>,
    alpha: f32,
) {
    let rect = rect.clip(image.width(), image.height());
    let alpha = alpha.clamp(0.0, 1.0);
    for y in 0..rect.height {
        for x in 0..rect.width {
            let inside = mask.is_none_or(|m| {
                x < m.width() && y < m.height() && m.get_pixel(x, y)[0] > 0
            });
            if !inside {
                continue;
            }
            let pixel = image.get_pixel_mut(rect.x + x, rect.y + y);
            for (dst, src) in pixel.0.iter_mut().zip(color.0) {
                let blended = alpha * src as f32 + (1.0 - alpha) * *dst as f32;
                *dst = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Copy of `image` with every analysed region tinted and eye boxes outlined.
///
/// Eye boxes are drawn in amber when jaundice was detected, green otherwise.
pub fn render_overlay(image: &RgbImage, analysis: &FaceAnalysis) -> RgbImage {
    let mut canvas = image.clone();
    for (&name, rect) in &analysis.region_boxes {
        tint_region(&mut canvas, rect, None, region_color(name), TINT_ALPHA);
    }
    let eye_color = if analysis.features.jaundice.detected {
        EYE_JAUNDICE
    } else {
        EYE_OK
    };
    for eye in &analysis.eye_boxes {
        let eye = eye.clip(canvas.width(), canvas.height());
        if eye.is_empty() {
            continue;
        }
        let rect = Rect::at(eye.x as i32, eye.y as i32).of_size(eye.width, eye.height);
        draw_hollow_rect_mut(&mut canvas, rect, eye_color);
    }
    canvas
}
