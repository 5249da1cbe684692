use super::regions::find_code_clusters;
use super::{DetectionKind, QrDetector, RawDetection, SymbolInfo};
use crate::config::ScannerConfig;
use crate::models::Point;
use image::{GrayImage, imageops};
use log::debug;
use rqrr::PreparedImage;

/// Detector backed by the `rqrr` crate.
///
/// `rqrr` can pair finder patterns of neighbouring codes into a grid that
/// does not decode. In multi mode, every cluster of dark pixels that holds no
/// decoded code yet is therefore cropped and read on its own.
#[derive(Debug, Clone)]
pub struct RqrrDetector {
    block_size: u32,
    offset: i32,
    cluster_cell: u32,
    max_clusters: usize,
}

impl RqrrDetector {
    /// Create the detector with default clustering
    pub fn new() -> Self {
        Self::from_config(&ScannerConfig::default())
    }

    /// Take the threshold and clustering parameters from `config`
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            block_size: config.enhance.adaptive_block_size,
            offset: config.enhance.adaptive_offset,
            cluster_cell: config.regions.cluster_cell,
            max_clusters: config.regions.max_clusters,
        }
    }

    /// Read the clusters no detection in `found` lies in, appending what decodes
    fn read_clusters(&self, image: &GrayImage, found: &mut Vec<RawDetection>) {
        let mut clusters =
            find_code_clusters(image, self.block_size, self.offset, self.cluster_cell);
        if clusters.len() < 2 {
            return;
        }
        clusters.truncate(self.max_clusters);

        for cluster in clusters {
            if found.iter().any(|d| cluster.contains(d.center())) {
                continue;
            }
            let margin = self.cluster_cell.max(cluster.width.max(cluster.height) / 6);
            let (x, y, w, h) = cluster.padded(margin, image.width(), image.height());
            let crop = imageops::crop_imm(image, x, y, w, h).to_image();
            let decoded = decode_grids(&crop, DetectionKind::Multi, (x as f32, y as f32));
            debug!(
                "rqrr: cluster {w}x{h} at ({x}, {y}) gave {} code(s)",
                decoded.len()
            );
            found.extend(decoded);
        }
    }
}

impl Default for RqrrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector for RqrrDetector {
    fn name(&self) -> &str {
        "rqrr"
    }

    fn detect(&self, image: &GrayImage, kind: DetectionKind) -> Vec<RawDetection> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let mut results = decode_grids(image, kind, (0.0, 0.0));
        if kind == DetectionKind::Multi && self.max_clusters > 0 {
            self.read_clusters(image, &mut results);
        }
        results
    }
}

/// Decode the grids `rqrr` finds in `image`; corners are shifted by `origin`
fn decode_grids(image: &GrayImage, kind: DetectionKind, origin: (f32, f32)) -> Vec<RawDetection> {
    let mut prepared = PreparedImage::prepare(image.clone());
    let grids = prepared.detect_grids();
    debug!(
        "rqrr: {} grid(s) in {}x{} image",
        grids.len(),
        image.width(),
        image.height()
    );

    let (ox, oy) = origin;
    let mut results = Vec::new();
    for (idx, grid) in grids.into_iter().enumerate() {
        match grid.decode() {
            Ok((meta, content)) => {
                let corners = grid
                    .bounds
                    .map(|p| Point::new(p.x as f32 + ox, p.y as f32 + oy));
                let symbol = SymbolInfo {
                    version: meta.version.0,
                    ecc_level: ecc_letter(meta.ecc_level),
                    mask: meta.mask,
                };
                debug!(
                    "rqrr: grid {} decoded (version {}, ECC {}, {} chars)",
                    idx,
                    symbol.version,
                    symbol.ecc_level,
                    content.len()
                );
                results.push(RawDetection {
                    content,
                    corners,
                    symbol: Some(symbol),
                });
                if kind == DetectionKind::Single {
                    break;
                }
            }
            Err(err) => debug!("rqrr: grid {} failed to decode: {}", idx, err),
        }
    }
    results
}

/// Letter of the two ECC format bits
fn ecc_letter(bits: u16) -> char {
    match bits & 3 {
        0 => 'M',
        1 => 'L',
        2 => 'H',
        _ => 'Q',
    }
}
