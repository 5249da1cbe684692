//! Potential QR regions and code clusters.
//!
//! [`find_candidate_regions`] is a diagnostic that runs next to detection. The
//! frame is adaptively thresholded, and every light area whose outer boundary
//! is not nested inside another light area is measured. Large, roughly square
//! ones are counted as places a QR code might be.
//!
//! [`find_code_clusters`] groups dark pixels that lie close together, so a
//! frame holding several codes can be read one code at a time.

use super::connected_components::{find_components, label_components};
use crate::config::{EnhanceConfig, RegionConfig};
use crate::models::{BitMatrix, Point};
use crate::utils::binarization::adaptive_threshold_gaussian;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Clusters narrower or shorter than a version 1 symbol at one pixel per module
pub const MIN_CLUSTER_SIDE: u32 = 21;

/// Square-ish light area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateRegion {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Area enclosed by the outer boundary, measured through pixel centres
    pub area: f64,
}

/// Find potential QR regions, largest first
pub fn find_candidate_regions(
    gray: &GrayImage,
    enhance: &EnhanceConfig,
    config: &RegionConfig,
) -> Vec<CandidateRegion> {
    if gray.width() == 0 || gray.height() == 0 {
        return Vec::new();
    }

    let binary =
        adaptive_threshold_gaussian(gray, enhance.adaptive_block_size, enhance.adaptive_offset);
    let (width, height) = (binary.width() as usize, binary.height() as usize);
    let outside = outer_background(&binary);

    // a light area together with the holes it encloses
    let mut filled = BitMatrix::new(width, height);
    for y in 0..height {
        for x in 0..width {
            if !outside.get(x, y) {
                filled.set(x, y, true);
            }
        }
    }
    let (labels, components) = label_components(&filled);

    let mut boundary = vec![0usize; components.len()];
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x] as usize;
            if label == 0 {
                continue;
            }
            let on_edge = x == 0
                || y == 0
                || x + 1 == width
                || y + 1 == height
                || outside.get(x - 1, y)
                || outside.get(x + 1, y)
                || outside.get(x, y - 1)
                || outside.get(x, y + 1);
            if on_edge {
                boundary[label - 1] += 1;
            }
        }
    }

    let mut regions: Vec<CandidateRegion> = components
        .iter()
        .zip(&boundary)
        .filter_map(|(c, &edge)| {
            // Pick's theorem over the polygon through the boundary pixel centres
            let area = (c.pixels as f64 - edge as f64 / 2.0 - 1.0).max(0.0);
            if area <= config.min_area as f64 {
                return None;
            }
            let (w, h) = (c.width(), c.height());
            let aspect = w as f32 / h as f32;
            if !(config.min_aspect..=config.max_aspect).contains(&aspect) {
                return None;
            }
            Some(CandidateRegion {
                x: c.min_x as u32,
                y: c.min_y as u32,
                width: w as u32,
                height: h as u32,
                area,
            })
        })
        .collect();

    regions.sort_by(|a, b| b.area.total_cmp(&a.area));
    regions
}

/// Dark pixels 4-connected to the space around the frame
fn outer_background(binary: &GrayImage) -> BitMatrix {
    let (width, height) = (binary.width() as usize, binary.height() as usize);
    let dark = |x: usize, y: usize| binary.get_pixel(x as u32, y as u32).0[0] < 128;

    let mut outside = BitMatrix::new(width, height);
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let visit = |x: usize, y: usize, outside: &mut BitMatrix, stack: &mut Vec<(usize, usize)>| {
        if dark(x, y) && !outside.get(x, y) {
            outside.set(x, y, true);
            stack.push((x, y));
        }
    };

    for x in 0..width {
        visit(x, 0, &mut outside, &mut stack);
        visit(x, height - 1, &mut outside, &mut stack);
    }
    for y in 0..height {
        visit(0, y, &mut outside, &mut stack);
        visit(width - 1, y, &mut outside, &mut stack);
    }

    while let Some((x, y)) = stack.pop() {
        if x > 0 {
            visit(x - 1, y, &mut outside, &mut stack);
        }
        if x + 1 < width {
            visit(x + 1, y, &mut outside, &mut stack);
        }
        if y > 0 {
            visit(x, y - 1, &mut outside, &mut stack);
        }
        if y + 1 < height {
            visit(x, y + 1, &mut outside, &mut stack);
        }
    }
    outside
}

/// Group of nearby dark pixels, possibly one code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCluster {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl CodeCluster {
    /// Whether `point` lies inside the cluster
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x as f32
            && point.y >= self.y as f32
            && point.x < (self.x + self.width) as f32
            && point.y < (self.y + self.height) as f32
    }

    /// `(x, y, width, height)` grown by `margin` on every side, clipped to the frame
    pub fn padded(&self, margin: u32, frame_width: u32, frame_height: u32) -> (u32, u32, u32, u32) {
        let x0 = self.x.saturating_sub(margin);
        let y0 = self.y.saturating_sub(margin);
        let x1 = (self.x + self.width).saturating_add(margin).min(frame_width);
        let y1 = (self.y + self.height).saturating_add(margin).min(frame_height);
        (x0, y0, x1 - x0, y1 - y0)
    }

    fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Group dark pixels of the adaptively thresholded frame, largest group first.
///
/// The frame is divided into `cell` x `cell` squares; squares holding a dark
/// pixel are joined with their 8 neighbours. Groups smaller than
/// [`MIN_CLUSTER_SIDE`] on either side are dropped.
pub fn find_code_clusters(
    gray: &GrayImage,
    block_size: u32,
    offset: i32,
    cell: u32,
) -> Vec<CodeCluster> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let cell = cell.max(1);
    let binary = adaptive_threshold_gaussian(gray, block_size, offset);

    let mut occupied = BitMatrix::new(
        width.div_ceil(cell) as usize,
        height.div_ceil(cell) as usize,
    );
    for (x, y, pixel) in binary.enumerate_pixels() {
        if pixel.0[0] < 128 {
            occupied.set((x / cell) as usize, (y / cell) as usize, true);
        }
    }

    let mut clusters: Vec<CodeCluster> = find_components(&occupied)
        .into_iter()
        .map(|c| {
            let x0 = c.min_x as u32 * cell;
            let y0 = c.min_y as u32 * cell;
            let x1 = ((c.max_x as u32 + 1) * cell).min(width);
            let y1 = ((c.max_y as u32 + 1) * cell).min(height);
            CodeCluster {
                x: x0,
                y: y0,
                width: x1 - x0,
                height: y1 - y0,
            }
        })
        .filter(|c| c.width >= MIN_CLUSTER_SIDE && c.height >= MIN_CLUSTER_SIDE)
        .collect();

    clusters.sort_by(|a, b| b.area().cmp(&a.area()));
    clusters
}
