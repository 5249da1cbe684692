//! Draw detected modules onto a copy of the frame.

use crate::error::{Result, ScanError};
use crate::models::{DetectedModule, ScanReport};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::Path;

/// Bounding box colour
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
/// Corner polygon colour
pub const CORNER_COLOR: Rgb<u8> = Rgb([0, 90, 255]);
/// Centre marker colour
pub const CENTER_COLOR: Rgb<u8> = Rgb([230, 0, 0]);

const CENTER_RADIUS: i32 = 4;
const BOX_THICKNESS: i32 = 2;

/// Copy of `frame` with every module of `report` drawn on it
pub fn annotate(frame: &DynamicImage, report: &ScanReport) -> RgbImage {
    let mut canvas = frame.to_rgb8();
    for module in &report.modules {
        draw_module(&mut canvas, module);
    }
    canvas
}

/// Draw one module: box, corner polygon, centre dot
pub fn draw_module(canvas: &mut RgbImage, module: &DetectedModule) {
    let bbox = &module.position.bounding_box;
    for inset in 0..BOX_THICKNESS {
        let width = bbox.width - 2 * inset;
        let height = bbox.height - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(bbox.min_x + inset, bbox.min_y + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
    }

    let corners = &module.position.corners;
    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        draw_line_segment_mut(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            CORNER_COLOR,
        );
    }

    let center = module.position.center;
    draw_filled_circle_mut(canvas, (center.x, center.y), CENTER_RADIUS, CENTER_COLOR);
}

/// Annotate and save; the format follows the file extension
pub fn save_annotated(frame: &DynamicImage, report: &ScanReport, path: &Path) -> Result<()> {
    annotate(frame, report)
        .save(path)
        .map_err(|source| ScanError::ImageSave {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectionKind;
    use crate::enhance::Enhancement;
    use crate::models::{BoundingBox, FrameDimensions, ModulePosition, PointI};
    use crate::pipeline::ScanProfile;
    use image::GrayImage;
    use serde_json::Map;

    fn report_with_module() -> ScanReport {
        let mut report = ScanReport::new("frame", ScanProfile::Standard, FrameDimensions::new(100, 80));
        report.push_module(
            Enhancement::Original,
            DetectionKind::Multi,
            ModulePosition {
                center: PointI::new(40, 30),
                bounding_box: BoundingBox::from_extents(20, 10, 60, 50),
                corners: [
                    PointI::new(20, 10),
                    PointI::new(60, 10),
                    PointI::new(60, 50),
                    PointI::new(20, 50),
                ],
            },
            "A".to_string(),
            Map::new(),
            None,
        );
        report
    }

    fn white() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 80, image::Luma([255])))
    }

    #[test]
    fn draws_center_and_outline() {
        let out = annotate(&white(), &report_with_module());
        assert_eq!(out.dimensions(), (100, 80));
        assert_eq!(*out.get_pixel(40, 30), CENTER_COLOR);
        // inner ring of the two-pixel box is not covered by the corner polygon
        assert_eq!(*out.get_pixel(21, 30), BOX_COLOR);
        assert_eq!(*out.get_pixel(90, 70), Rgb([255, 255, 255]));
    }

    #[test]
    fn corner_polygon_is_drawn_last_on_the_outline() {
        let out = annotate(&white(), &report_with_module());
        assert_eq!(*out.get_pixel(40, 10), CORNER_COLOR);
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.png");
        save_annotated(&white(), &report_with_module(), &path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (100, 80));
    }

    #[test]
    fn empty_report_leaves_frame_untouched() {
        let report = ScanReport::new("frame", ScanProfile::Standard, FrameDimensions::new(100, 80));
        let out = annotate(&white(), &report);
        assert!(out.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }
}
