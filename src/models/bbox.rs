use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in original-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub min_x: i32,
    /// Top edge
    pub min_y: i32,
    /// Right edge
    pub max_x: i32,
    /// Bottom edge
    pub max_y: i32,
    /// `max_x - min_x`
    pub width: i32,
    /// `max_y - min_y`
    pub height: i32,
}

impl BoundingBox {
    /// Build from edges; width and height are derived
    pub fn from_extents(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}
