use serde::{Deserialize, Serialize};

/// 2D point with floating point coordinates, as reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Map a point from an enhanced image back into the original frame.
    ///
    /// Coordinates are divided by `scale` and truncated toward zero.
    pub fn unscale(&self, scale: f32) -> PointI {
        PointI::new((self.x / scale) as i32, (self.y / scale) as i32)
    }
}

/// Integer pixel coordinate in the original frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointI {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl PointI {
    /// Create a new integer point
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
