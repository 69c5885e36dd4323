//! Anatomical region extraction.
//!
//! Two interchangeable strategies implement [`RegionExtractor`]:
//!
//! * [`FractionalRegions`] slices fixed proportional boxes out of the frame. It
//!   needs no face detection and degrades gracefully on any image, but it
//!   never reports eyes.
//! * [`LandmarkRegions`] crops the bounding rectangle of each landmark polygon
//!   and zeroes the pixels outside the polygon, keeping a mask of the interior.
//!
//! A deployment picks one of them through `AnalysisSettings::region_strategy`.
//! Zero-area crops are reported as empty regions, never as errors.

use std::collections::BTreeMap;

use image::{GrayImage, Rgb, RgbImage, imageops};
use mukha_utils::{HsvStats, PixelRect, Point, hsv_stats, polygon_area, polygon_bounds, polygon_mask};

use crate::features::RegionName;
use crate::landmarks::{
    FOREHEAD, FaceLandmarks, LEFT_CHEEK, LEFT_EYE, RIGHT_CHEEK, RIGHT_EYE, UNDER_EYE_LEFT,
    UNDER_EYE_RIGHT,
};

/// A cropped sub-image plus, for polygon crops, the interior mask.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCrop {
    /// Location of the crop inside the source frame.
    pub rect: PixelRect,
    pub image: RgbImage,
    /// Non-zero where the pixel lies inside the polygon. `None` for box crops.
    pub mask: Option<GrayImage>,
}

impl RegionCrop {
    /// A region that could not be cropped.
    pub fn empty() -> Self {
        Self {
            rect: PixelRect::new(0, 0, 0, 0),
            image: RgbImage::new(0, 0),
            mask: None,
        }
    }

    /// Plain rectangular crop, clipped to the frame.
    pub fn from_rect(image: &RgbImage, rect: PixelRect) -> Self {
        let rect = rect.clip(image.width(), image.height());
        if rect.is_empty() {
            return Self::empty();
        }
        let crop = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
        Self {
            rect,
            image: crop,
            mask: None,
        }
    }

    /// `true` when no pixel of the region is usable.
    pub fn is_empty(&self) -> bool {
        if self.rect.is_empty() {
            return true;
        }
        self.mask
            .as_ref()
            .is_some_and(|mask| mask.pixels().all(|p| p[0] == 0))
    }

    /// HSV statistics over the region interior, `None` for empty regions.
    pub fn stats(&self) -> Option<HsvStats> {
        if self.is_empty() {
            return None;
        }
        hsv_stats(&self.image, self.mask.as_ref())
    }
}

/// Crop the bounding rectangle of a pixel-space polygon and zero its exterior.
///
/// Degenerate polygons (zero area, e.g. every vertex identical) and polygons
/// entirely outside the frame yield [`RegionCrop::empty`].
pub fn polygon_crop(image: &RgbImage, points: &[Point], pad: u32) -> RegionCrop {
    if polygon_area(points) <= f32::EPSILON {
        return RegionCrop::empty();
    }
    let Some(bounds) = polygon_bounds(points) else {
        return RegionCrop::empty();
    };
    let rect = bounds.padded(pad).clip(image.width(), image.height());
    if rect.is_empty() {
        return RegionCrop::empty();
    }

    // Vertices sit on pixel centres so boundary pixels are filled.
    let origin = Point::new(rect.x as f32 - 0.5, rect.y as f32 - 0.5);
    let local: Vec<Point> = points.iter().map(|&p| p - origin).collect();
    let Some(mask) = polygon_mask(rect.width, rect.height, &local) else {
        return RegionCrop::empty();
    };

    let mut crop = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
    for (pixel, m) in crop.pixels_mut().zip(mask.pixels()) {
        if m[0] == 0 {
            *pixel = Rgb([0, 0, 0]);
        }
    }

    RegionCrop {
        rect,
        image: crop,
        mask: Some(mask),
    }
}

/// Strategy for isolating named facial regions and eye boxes.
pub trait RegionExtractor {
    /// Crop every region this strategy knows about. Regions may be empty.
    fn crop_named_regions(&self, image: &RgbImage) -> BTreeMap<RegionName, RegionCrop>;

    /// Eye bounding boxes in frame coordinates. Empty boxes are omitted.
    fn eye_boxes(&self, image: &RgbImage) -> Vec<PixelRect>;
}

/// Fixed proportional boxes `(x0, y0, x1, y1)` of the full frame.
const FRACTIONAL_BOXES: [(RegionName, [f64; 4]); 3] = [
    (RegionName::Forehead, [0.30, 0.10, 0.70, 0.25]),
    (RegionName::Cheeks, [0.15, 0.30, 0.85, 0.60]),
    (RegionName::Chin, [0.35, 0.65, 0.65, 0.90]),
];

/// Region extraction from fixed fractions of the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FractionalRegions;

impl RegionExtractor for FractionalRegions {
    fn crop_named_regions(&self, image: &RgbImage) -> BTreeMap<RegionName, RegionCrop> {
        let (w, h) = image.dimensions();
        FRACTIONAL_BOXES
            .iter()
            .map(|&(name, [x0, y0, x1, y1])| {
                let rect = PixelRect::from_fractions(w, h, x0, y0, x1, y1);
                (name, RegionCrop::from_rect(image, rect))
            })
            .collect()
    }

    /// Fixed fractions cannot locate eyes, so none are reported.
    fn eye_boxes(&self, _image: &RgbImage) -> Vec<PixelRect> {
        Vec::new()
    }
}

/// Region extraction from facial landmark polygons.
#[derive(Debug, Clone)]
pub struct LandmarkRegions {
    landmarks: FaceLandmarks,
    padding: u32,
}

impl LandmarkRegions {
    pub fn new(landmarks: FaceLandmarks, padding: u32) -> Self {
        Self { landmarks, padding }
    }

    const GROUPS: [(RegionName, &'static [usize]); 7] = [
        (RegionName::LeftEye, &LEFT_EYE),
        (RegionName::RightEye, &RIGHT_EYE),
        (RegionName::UnderEyeLeft, &UNDER_EYE_LEFT),
        (RegionName::UnderEyeRight, &UNDER_EYE_RIGHT),
        (RegionName::Forehead, &FOREHEAD),
        (RegionName::LeftCheek, &LEFT_CHEEK),
        (RegionName::RightCheek, &RIGHT_CHEEK),
    ];
}

impl RegionExtractor for LandmarkRegions {
    fn crop_named_regions(&self, image: &RgbImage) -> BTreeMap<RegionName, RegionCrop> {
        let (w, h) = image.dimensions();
        Self::GROUPS
            .iter()
            .map(|&(name, group)| {
                let crop = match self.landmarks.polygon(group, w, h) {
                    Some(points) => polygon_crop(image, &points, self.padding),
                    None => RegionCrop::empty(),
                };
                (name, crop)
            })
            .collect()
    }

    fn eye_boxes(&self, image: &RgbImage) -> Vec<PixelRect> {
        let (w, h) = image.dimensions();
        [&LEFT_EYE[..], &RIGHT_EYE[..]]
            .into_iter()
            .filter_map(|group| self.landmarks.polygon(group, w, h))
            .filter(|points| polygon_area(points) > f32::EPSILON)
            .filter_map(|points| polygon_bounds(&points))
            .map(|rect| rect.clip(w, h))
            .filter(|rect| !rect.is_empty())
            .collect()
    }
}
