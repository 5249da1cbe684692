//! QR frame scanner
//!
//! Finds every QR-coded module in a photographed frame and reports where each
//! one sits (centre, bounding box, corners in original-frame pixels) together
//! with its payload parsed as device information.
//!
//! Symbol localisation and decoding are delegated to [`rqrr`] behind the
//! [`detector::QrDetector`] trait. Frames that do not read on the first try go
//! through a fixed retry plan of enhancement filters ([`Enhancement`]) chosen
//! by a [`ScanProfile`].
//!
//! ```no_run
//! use qr_frame_scanner::{ScanProfile, Scanner};
//! use std::path::Path;
//!
//! let scanner = Scanner::new(ScanProfile::LowRes);
//! let report = scanner.scan_path(Path::new("frame.png"))?;
//! for module in &report.modules {
//!     println!("{} at {:?}", module.qr_code_data, module.position.center);
//! }
//! # Ok::<(), qr_frame_scanner::ScanError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Drawing detected modules onto frames
pub mod annotate;
/// Enhanced vs low-resolution profile comparison
pub mod compare;
/// Scanner configuration and environment overrides
pub mod config;
/// `QR_DEBUG` and log level selection
pub mod debug;
/// Detector seam, `rqrr` backend and potential-region search
pub mod detector;
/// Enhancement filters
pub mod enhance;
/// Error type
pub mod error;
/// JSON and CSV export
pub mod export;
/// Test frame generation
pub mod generate;
/// Core data structures (points, boxes, reports)
pub mod models;
/// Decoded text to device info
pub mod payload;
/// The enhancement retry loop
pub mod pipeline;
/// Image loading and dataset helpers
pub mod tools;
/// Utility functions (grayscale, binarization, geometry)
pub mod utils;

pub use config::{
    DenoiseConfig, EnhanceConfig, MAX_UPSCALE_FACTOR, RegionConfig, ScannerConfig,
};
pub use detector::{DetectionKind, QrDetector, RawDetection, RqrrDetector, SymbolInfo};
pub use enhance::Enhancement;
pub use error::{Result, ScanError};
pub use models::{
    AttemptRecord, BoundingBox, DetectedModule, ErrorReport, FrameDimensions, ModulePosition,
    Point, PointI, ScanReport,
};
pub use pipeline::{BatchOutcome, ScanProfile, Scanner};

use std::path::Path;

/// Scan an image file with the default low-resolution profile
///
/// # Arguments
/// * `path` - Image file (PNG, JPEG, GIF, BMP, TIFF)
///
/// # Returns
/// The scan report, or an error if the file cannot be loaded
pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<ScanReport> {
    Scanner::new(ScanProfile::default()).scan_path(path.as_ref())
}

/// Scan a raw RGB frame with the default low-resolution profile
///
/// # Arguments
/// * `image` - Raw RGB bytes (3 bytes per pixel)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// The scan report, labelled `frame`, or an error if the buffer size is wrong
pub fn scan_rgb(image: &[u8], width: u32, height: u32) -> Result<ScanReport> {
    Scanner::new(ScanProfile::default()).scan_rgb(image, width, height, "frame")
}
