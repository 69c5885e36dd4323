//! Facial landmark service seam and the named index groups used for cropping.
//!
//! Indices follow the MediaPipe Face Mesh topology. Coordinates are normalized
//! to the frame: `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use image::RgbImage;
use mukha_utils::{PixelRect, Point, polygon_bounds};
use serde::{Deserialize, Serialize};

pub const LEFT_EYE: [usize; 7] = [33, 133, 159, 145, 153, 154, 155];
pub const RIGHT_EYE: [usize; 7] = [263, 362, 386, 374, 380, 381, 382];
pub const UNDER_EYE_LEFT: [usize; 5] = [145, 153, 154, 155, 157];
pub const UNDER_EYE_RIGHT: [usize; 5] = [374, 380, 381, 382, 384];
pub const FOREHEAD: [usize; 9] = [10, 338, 297, 332, 284, 251, 389, 356, 454];
pub const LEFT_CHEEK: [usize; 6] = [50, 101, 118, 229, 230, 205];
pub const RIGHT_CHEEK: [usize; 6] = [280, 330, 347, 449, 448, 425];

/// Normalized landmark coordinates for a single face, indexed by mesh index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub points: Vec<Point>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Pixel-space polygon for an index group, or `None` if any index is missing.
    ///
    /// Vertices are truncated onto whole pixels.
    pub fn polygon(&self, group: &[usize], width: u32, height: u32) -> Option<Vec<Point>> {
        group
            .iter()
            .map(|&idx| {
                self.points.get(idx).map(|p| {
                    let px = p.denormalize(width, height);
                    Point::new(px.x.trunc(), px.y.trunc())
                })
            })
            .collect()
    }

    /// Bounding box of every landmark, clipped to the frame.
    pub fn face_box(&self, width: u32, height: u32) -> Option<PixelRect> {
        let pixels: Vec<Point> = self
            .points
            .iter()
            .map(|p| p.denormalize(width, height))
            .collect();
        let rect = polygon_bounds(&pixels)?.clip(width, height);
        (!rect.is_empty()).then_some(rect)
    }
}

/// External facial landmark detector.
pub trait LandmarkService: Send + Sync {
    /// Landmarks for the single subject, or `Ok(None)` when no face was found.
    fn landmarks(&self, image: &RgbImage) -> Result<Option<FaceLandmarks>>;
}

/// Serves landmarks loaded from a JSON document (`{"points": [{"x":..,"y":..}, ...]}`).
#[derive(Debug, Clone)]
pub struct JsonLandmarkService {
    landmarks: Option<FaceLandmarks>,
}

impl JsonLandmarkService {
    pub fn new(landmarks: Option<FaceLandmarks>) -> Self {
        Self { landmarks }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read landmarks {}", path.display()))?;
        let landmarks: FaceLandmarks = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse landmarks JSON at {}", path.display()))?;
        let landmarks = (!landmarks.points.is_empty()).then_some(landmarks);
        Ok(Self { landmarks })
    }
}

impl LandmarkService for JsonLandmarkService {
    fn landmarks(&self, _image: &RgbImage) -> Result<Option<FaceLandmarks>> {
        Ok(self.landmarks.clone())
    }
}
