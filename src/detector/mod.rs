//! QR code detection
//!
//! Locating and decoding symbols is delegated to an external detector behind
//! the [`QrDetector`] trait. This module also hosts the cheap region search
//! used to report how many square-ish light areas a frame contains, and the
//! dark-pixel clustering that lets the detector read codes one at a time.

/// Connected dark components over a bit mask
pub mod connected_components;
/// Potential QR regions and code clusters from an adaptively thresholded frame
pub mod regions;
/// `rqrr`-backed detector
pub mod rqrr_detector;

pub use regions::{CandidateRegion, CodeCluster, find_candidate_regions, find_code_clusters};
pub use rqrr_detector::RqrrDetector;

use crate::models::Point;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many codes a single detector call may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    /// Stop at the first decodable code
    Single,
    /// Return every decodable code
    Multi,
}

impl DetectionKind {
    /// Stable lowercase name
    pub fn name(self) -> &'static str {
        match self {
            DetectionKind::Single => "single",
            DetectionKind::Multi => "multi",
        }
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format metadata of a decoded symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Version, 1 to 40
    pub version: usize,
    /// Error correction level: `L`, `M`, `Q` or `H`
    pub ecc_level: char,
    /// Data mask pattern, 0 to 7
    pub mask: u16,
}

/// A decoded code in the coordinates of the image handed to the detector
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Decoded text (may be empty; the scanner drops those)
    pub content: String,
    /// Corners, clockwise from the top-left of the symbol
    pub corners: [Point; 4],
    /// Format metadata when the backend reports it
    pub symbol: Option<SymbolInfo>,
}

impl RawDetection {
    /// Mean of the four corners
    pub fn center(&self) -> Point {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }
}

/// External QR localisation and decoding capability
pub trait QrDetector: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Detect and decode codes in a grayscale image
    fn detect(&self, image: &GrayImage, kind: DetectionKind) -> Vec<RawDetection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_corner_mean() {
        let detection = RawDetection {
            content: "x".to_string(),
            corners: [
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 20.0),
                Point::new(0.0, 20.0),
            ],
            symbol: None,
        };
        assert_eq!(detection.center(), Point::new(5.0, 10.0));
    }

    #[test]
    fn symbol_info_json() {
        let info = SymbolInfo {
            version: 2,
            ecc_level: 'L',
            mask: 5,
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["ecc_level"], "L");
        assert_eq!(json["version"], 2);
    }

    #[test]
    fn kind_names() {
        assert_eq!(DetectionKind::Single.to_string(), "single");
        assert_eq!(
            serde_json::to_string(&DetectionKind::Multi).unwrap(),
            "\"multi\""
        );
    }
}
