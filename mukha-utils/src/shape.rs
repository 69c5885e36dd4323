//! Rectangle and polygon helpers for anatomical region crops.
//!
//! Polygons are rasterised with `tiny-skia` into 8-bit masks where 255 marks
//! interior pixels and 0 marks everything else.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::point::Point;

/// Axis-aligned rectangle in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from fractional bounds of a `width` x `height` frame.
    ///
    /// Edges are truncated the same way integer slicing truncates, so
    /// `(0.1, 0.25)` of a 100 px frame covers rows `10..25`.
    pub fn from_fractions(width: u32, height: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let fx = |f: f64| ((width as f64 * f) as u32).min(width);
        let fy = |f: f64| ((height as f64 * f) as u32).min(height);
        let (left, right) = (fx(x0), fx(x1));
        let (top, bottom) = (fy(y0), fy(y1));
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Intersect the rectangle with a `width` x `height` frame.
    pub fn clip(&self, width: u32, height: u32) -> PixelRect {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.right().min(width);
        let y1 = self.bottom().min(height);
        PixelRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Grow the rectangle by `pad` pixels on every side, saturating at zero.
    pub fn padded(&self, pad: u32) -> PixelRect {
        let x = self.x.saturating_sub(pad);
        let y = self.y.saturating_sub(pad);
        PixelRect::new(
            x,
            y,
            self.right().saturating_add(pad) - x,
            self.bottom().saturating_add(pad) - y,
        )
    }
}

/// Signed-area magnitude of a polygon (shoelace formula).
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() * 0.5
}

/// Integer bounding rectangle of a polygon, inclusive of the extreme pixels.
///
/// Negative coordinates are clamped to zero; the result is not clipped to any frame.
pub fn polygon_bounds(points: &[Point]) -> Option<PixelRect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points.iter().skip(1) {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.floor().max(0.0) as u32).saturating_add(1);
    let y1 = (max_y.floor().max(0.0) as u32).saturating_add(1);
    Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
}

/// Rasterise a polygon (in the mask's own coordinates) into a binary mask.
///
/// Returns `None` when the mask would have zero area or the polygon cannot be
/// turned into a path (fewer than three points, or degenerate geometry).
pub fn polygon_mask(width: u32, height: u32, points: &[Point]) -> Option<GrayImage> {
    if points.len() < 3 {
        return None;
    }
    let mut pixmap = Pixmap::new(width, height)?;

    let mut builder = PathBuilder::new();
    builder.move_to(points[0].x, points[0].y);
    for point in points.iter().skip(1) {
        builder.line_to(point.x, point.y);
    }
    builder.close();
    let path = builder.finish()?;

    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = false;
    pixmap.fill_path(
        &path,
        &paint,
        FillRule::Winding,
        Transform::identity(),
        None,
    );

    let mut mask = GrayImage::new(width, height);
    for (dst, src) in mask.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        *dst = Luma([if src[3] > 127 { 255 } else { 0 }]);
    }
    Some(mask)
}
