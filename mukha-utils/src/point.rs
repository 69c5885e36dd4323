use std::ops::Sub;

use serde::{Deserialize, Serialize};

/// Single 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale a normalized point into pixel space.
    pub fn denormalize(self, width: u32, height: u32) -> Point {
        Point {
            x: self.x * width as f32,
            y: self.y * height as f32,
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}
