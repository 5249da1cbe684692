/// Geometry helpers for mapping detector output back into the original frame
use crate::models::{BoundingBox, ModulePosition, Point};

/// Ratio between an enhanced image and the original frame, by width
pub fn scale_factor(enhanced_width: u32, original_width: u32) -> f32 {
    if enhanced_width == 0 || original_width == 0 {
        return 1.0;
    }
    enhanced_width as f32 / original_width as f32
}

/// Position of a module in original-frame pixels.
///
/// Centre, edges and corners are each divided by `scale` and truncated, so
/// the centre is the truncated mean rather than the mean of truncated corners.
pub fn module_position(corners: &[Point; 4], scale: f32) -> ModulePosition {
    let (sum_x, sum_y) = corners
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    let center = Point::new(sum_x / 4.0, sum_y / 4.0).unscale(scale);

    let mut min = Point::new(f32::INFINITY, f32::INFINITY);
    let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in corners {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let min = min.unscale(scale);
    let max = max.unscale(scale);

    ModulePosition {
        center,
        bounding_box: BoundingBox::from_extents(min.x, min.y, max.x, max.y),
        corners: corners.map(|p| p.unscale(scale)),
    }
}

/// Size that fits `width`x`height` inside `max_dim`, or `None` if it already fits
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if max_dim == 0 || longest <= max_dim {
        return None;
    }
    let ratio = max_dim as f32 / longest as f32;
    let w = ((width as f32 * ratio).round() as u32).max(1);
    let h = ((height as f32 * ratio).round() as u32).max(1);
    Some((w, h))
}
