//! The enhancement retry loop.
//!
//! A [`Scanner`] walks the plan of its [`ScanProfile`]: for every enhancement
//! it builds the enhanced frame once, runs the detector with each detection
//! kind, and stops at the first attempt that yields a code with data.

use crate::config::ScannerConfig;
use crate::detector::{DetectionKind, QrDetector, RawDetection, RqrrDetector, find_candidate_regions};
use crate::enhance::Enhancement;
use crate::error::{Result, ScanError};
use crate::models::{AttemptRecord, ErrorReport, FrameDimensions, ScanReport};
use crate::payload::parse_device_info;
use crate::utils::geometry::{fit_within, module_position, scale_factor};
use crate::utils::grayscale::{frame_to_gray, image_to_gray};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Two codes with the same data closer than this (enhanced-image pixels) are one code
const DUPLICATE_DISTANCE: f32 = 50.0;

const STANDARD_PLAN: [Enhancement; 1] = [Enhancement::Original];

const ENHANCED_PLAN: [Enhancement; 4] = [
    Enhancement::Original,
    Enhancement::BlurReduced,
    Enhancement::ContrastEnhanced,
    Enhancement::AdaptiveThreshGaussian,
];

const LOW_RES_PLAN: [Enhancement; 16] = [
    Enhancement::Original,
    Enhancement::UpscaleLinear,
    Enhancement::UpscaleCubic,
    Enhancement::UpscaleLanczos,
    Enhancement::Denoised,
    Enhancement::HistEq,
    Enhancement::Clahe,
    Enhancement::Sharpened,
    Enhancement::MorphClose,
    Enhancement::MorphOpen,
    Enhancement::EdgeEnhanced,
    Enhancement::Bilateral,
    Enhancement::AdaptiveThreshMean,
    Enhancement::AdaptiveThreshGaussian,
    Enhancement::ComboDenoiseUpscaleSharpen,
    Enhancement::ComboClaheUpscale,
];

const WEB_PLAN: [Enhancement; 2] = [Enhancement::Original, Enhancement::UpscaleCubic];

const MULTI_ONLY: [DetectionKind; 1] = [DetectionKind::Multi];
const SINGLE_THEN_MULTI: [DetectionKind; 2] = [DetectionKind::Single, DetectionKind::Multi];

/// Fixed retry plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanProfile {
    /// One multi-code pass on the grayscale frame
    Standard,
    /// Four light enhancements plus a potential-region count
    Enhanced,
    /// Sixteen enhancements, each with single then multi detection
    #[default]
    LowRes,
    /// Original, then a cubic upscale
    Web,
}

impl ScanProfile {
    /// Every profile
    pub const ALL: [ScanProfile; 4] = [
        ScanProfile::Standard,
        ScanProfile::Enhanced,
        ScanProfile::LowRes,
        ScanProfile::Web,
    ];

    /// Stable snake_case name
    pub fn name(self) -> &'static str {
        match self {
            ScanProfile::Standard => "standard",
            ScanProfile::Enhanced => "enhanced",
            ScanProfile::LowRes => "low_res",
            ScanProfile::Web => "web",
        }
    }

    /// Enhancements in the order they are tried
    pub fn enhancements(self) -> &'static [Enhancement] {
        match self {
            ScanProfile::Standard => &STANDARD_PLAN,
            ScanProfile::Enhanced => &ENHANCED_PLAN,
            ScanProfile::LowRes => &LOW_RES_PLAN,
            ScanProfile::Web => &WEB_PLAN,
        }
    }

    /// Detection kinds tried on each enhanced image
    pub fn detection_kinds(self) -> &'static [DetectionKind] {
        match self {
            ScanProfile::LowRes => &SINGLE_THEN_MULTI,
            _ => &MULTI_ONLY,
        }
    }

    /// Whether reports carry `potential_qr_regions`
    pub fn counts_regions(self) -> bool {
        self == ScanProfile::Enhanced
    }

    /// Number of detector calls when nothing is found
    pub fn max_attempts(self) -> usize {
        self.enhancements().len() * self.detection_kinds().len()
    }
}

impl fmt::Display for ScanProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScanProfile {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ScanProfile::ALL
            .into_iter()
            .find(|p| p.name() == normalized)
            .ok_or_else(|| {
                ScanError::config(format!(
                    "unknown profile '{s}' (expected standard, enhanced, low-res or web)"
                ))
            })
    }
}

/// Result of one frame in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    /// The frame loaded and was scanned (possibly with no modules)
    Report(ScanReport),
    /// The frame could not be scanned
    Failed(ErrorReport),
}

impl BatchOutcome {
    /// Modules found, zero for failures
    pub fn modules_detected(&self) -> usize {
        match self {
            BatchOutcome::Report(report) => report.modules_detected,
            BatchOutcome::Failed(_) => 0,
        }
    }
}

/// Frame scanner: a profile, its configuration and a detector backend
pub struct Scanner {
    profile: ScanProfile,
    config: ScannerConfig,
    detector: Box<dyn QrDetector>,
}

impl Scanner {
    /// Scanner with default configuration and the `rqrr` backend
    pub fn new(profile: ScanProfile) -> Self {
        Self::with_config(profile, ScannerConfig::default())
    }

    /// Scanner with explicit configuration and the `rqrr` backend
    pub fn with_config(profile: ScanProfile, config: ScannerConfig) -> Self {
        let detector = RqrrDetector::from_config(&config);
        Self::with_detector(profile, config, detector)
    }

    /// Scanner with a custom detector backend
    pub fn with_detector<D>(profile: ScanProfile, config: ScannerConfig, detector: D) -> Self
    where
        D: QrDetector + 'static,
    {
        Self {
            profile,
            config,
            detector: Box::new(detector),
        }
    }

    /// Active retry plan
    pub fn profile(&self) -> ScanProfile {
        self.profile
    }

    /// Active configuration
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Load an image file and scan it
    pub fn scan_path(&self, path: &Path) -> Result<ScanReport> {
        let image = crate::tools::load_image(path)?;
        Ok(self.scan_image(&image, &path.display().to_string()))
    }

    /// Scan a decoded image of any colour type
    pub fn scan_image(&self, image: &DynamicImage, source: &str) -> ScanReport {
        self.scan_gray(&image_to_gray(image), source)
    }

    /// Scan an interleaved RGB frame
    pub fn scan_rgb(&self, rgb: &[u8], width: u32, height: u32, source: &str) -> Result<ScanReport> {
        let gray = frame_to_gray(rgb, width as usize, height as usize, 3)?;
        Ok(self.scan_gray(&gray, source))
    }

    /// Scan a grayscale frame
    pub fn scan_gray(&self, gray: &GrayImage, source: &str) -> ScanReport {
        let dims = FrameDimensions::of(gray);
        let mut report = ScanReport::new(source, self.profile, dims);
        let working = self.working_frame(gray);

        if self.profile.counts_regions() {
            let regions =
                find_candidate_regions(&working, &self.config.enhance, &self.config.regions);
            debug!("{source}: {} potential QR region(s)", regions.len());
            report.potential_qr_regions = Some(regions.len());
        }

        for &enhancement in self.profile.enhancements() {
            let enhanced = enhancement.apply(&working, &self.config.enhance);
            let scale = scale_factor(enhanced.width(), dims.width);
            let image_size = FrameDimensions::of(&enhanced).to_string();

            for &kind in self.profile.detection_kinds() {
                let detections = self.detector.detect(&enhanced, kind);
                let accepted = accept(&detections);
                info!(
                    "{source}: {enhancement}/{kind} on {image_size}: {} located, {} accepted",
                    detections.len(),
                    accepted.len()
                );

                report.attempts.push(AttemptRecord {
                    enhancement,
                    detection_type: kind,
                    detected: !detections.is_empty(),
                    count: detections.len(),
                    image_size: image_size.clone(),
                    success: !accepted.is_empty(),
                });

                if accepted.is_empty() {
                    continue;
                }
                for detection in accepted {
                    let position = module_position(&detection.corners, scale);
                    let device_info = parse_device_info(&detection.content);
                    report.push_module(
                        enhancement,
                        kind,
                        position,
                        detection.content.clone(),
                        device_info,
                        detection.symbol,
                    );
                }
                info!(
                    "{source}: {} module(s) via {enhancement}/{kind}",
                    report.modules_detected
                );
                return report;
            }
        }

        warn!(
            "{source}: no QR codes after {} attempt(s)",
            report.attempts.len()
        );
        report
    }

    /// Scan many files in parallel; order follows `paths`
    pub fn scan_paths(&self, paths: &[PathBuf]) -> Vec<BatchOutcome> {
        paths
            .par_iter()
            .map(|path| match self.scan_path(path) {
                Ok(report) => BatchOutcome::Report(report),
                Err(err) => {
                    warn!("{}: {err}", path.display());
                    BatchOutcome::Failed(ErrorReport::new(&err, Some(path.display().to_string())))
                }
            })
            .collect()
    }

    fn working_frame(&self, gray: &GrayImage) -> GrayImage {
        let Some(max_dim) = self.config.max_dimension else {
            return gray.clone();
        };
        match fit_within(gray.width(), gray.height(), max_dim) {
            Some((w, h)) => {
                debug!(
                    "downscaling {}x{} to {w}x{h} for detection",
                    gray.width(),
                    gray.height()
                );
                imageops::resize(gray, w, h, FilterType::Triangle)
            }
            None => gray.clone(),
        }
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("profile", &self.profile)
            .field("config", &self.config)
            .field("detector", &self.detector.name())
            .finish()
    }
}

/// Detections with data, duplicates (same data, nearby centre) removed
fn accept(detections: &[RawDetection]) -> Vec<&RawDetection> {
    let mut accepted: Vec<&RawDetection> = Vec::new();
    for detection in detections {
        if detection.content.is_empty() {
            continue;
        }
        let center = detection.center();
        let duplicate = accepted.iter().any(|seen| {
            seen.content == detection.content
                && seen.center().distance(&center) < DUPLICATE_DISTANCE
        });
        if !duplicate {
            accepted.push(detection);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, Point, PointI};
    use image::Luma;

    /// Answers only for images of a given width and detection kind
    struct MockDetector {
        width: u32,
        kind: Option<DetectionKind>,
        found: Vec<RawDetection>,
    }

    impl MockDetector {
        fn new(width: u32, kind: Option<DetectionKind>, found: Vec<RawDetection>) -> Self {
            Self { width, kind, found }
        }
    }

    impl QrDetector for MockDetector {
        fn name(&self) -> &str {
            "mock"
        }

        fn detect(&self, image: &GrayImage, kind: DetectionKind) -> Vec<RawDetection> {
            let kind_matches = self.kind.is_none_or(|k| k == kind);
            if image.width() == self.width && kind_matches {
                self.found.clone()
            } else {
                Vec::new()
            }
        }
    }

    fn square(content: &str, x: f32, y: f32, size: f32) -> RawDetection {
        RawDetection {
            content: content.to_string(),
            corners: [
                Point::new(x, y),
                Point::new(x + size, y),
                Point::new(x + size, y + size),
                Point::new(x, y + size),
            ],
            symbol: None,
        }
    }

    fn frame() -> GrayImage {
        GrayImage::from_pixel(40, 30, Luma([200]))
    }

    #[test]
    fn profile_plans() {
        assert_eq!(ScanProfile::Standard.max_attempts(), 1);
        assert_eq!(ScanProfile::Enhanced.max_attempts(), 4);
        assert_eq!(ScanProfile::LowRes.max_attempts(), 32);
        assert_eq!(ScanProfile::Web.max_attempts(), 2);
        assert_eq!(ScanProfile::default(), ScanProfile::LowRes);
        assert!(ScanProfile::Enhanced.counts_regions());
        assert!(!ScanProfile::LowRes.counts_regions());
    }

    #[test]
    fn profile_parsing() {
        assert_eq!("low-res".parse::<ScanProfile>().unwrap(), ScanProfile::LowRes);
        assert_eq!("LOW_RES".parse::<ScanProfile>().unwrap(), ScanProfile::LowRes);
        assert_eq!("web".parse::<ScanProfile>().unwrap(), ScanProfile::Web);
        assert!(matches!(
            "fast".parse::<ScanProfile>(),
            Err(ScanError::Config(_))
        ));
    }

    #[test]
    fn stops_at_first_upscaled_success_and_maps_back() {
        let detector = MockDetector::new(
            80,
            Some(DetectionKind::Single),
            vec![square("MODULE_001", 20.0, 10.0, 30.0)],
        );
        let scanner = Scanner::with_detector(ScanProfile::LowRes, ScannerConfig::default(), detector);
        let report = scanner.scan_gray(&frame(), "frame");

        // original single, original multi, upscale_linear single
        assert_eq!(report.attempts.len(), 3);
        assert!(!report.attempts[0].success);
        assert!(!report.attempts[1].success);
        let winner = report.winning_attempt().unwrap();
        assert_eq!(winner.enhancement, Enhancement::UpscaleLinear);
        assert_eq!(winner.image_size, "80x60");

        assert_eq!(report.modules_detected, 1);
        let module = &report.modules[0];
        assert_eq!(module.module_id, 1);
        assert_eq!(module.enhancement, Enhancement::UpscaleLinear);
        assert_eq!(module.detection_type, DetectionKind::Single);
        assert_eq!(module.position.center, PointI::new(17, 12));
        assert_eq!(
            module.position.bounding_box,
            BoundingBox::from_extents(10, 5, 25, 20)
        );
        assert_eq!(module.device_id().as_deref(), Some("MODULE_001"));
    }

    #[test]
    fn exhausts_plan_when_nothing_found() {
        let detector = MockDetector::new(0, None, Vec::new());
        let scanner = Scanner::with_detector(ScanProfile::LowRes, ScannerConfig::default(), detector);
        let report = scanner.scan_gray(&frame(), "frame");
        assert_eq!(report.modules_detected, 0);
        assert!(report.modules.is_empty());
        assert_eq!(report.attempts.len(), 32);
        assert!(report.winning_attempt().is_none());

        let kinds: Vec<DetectionKind> =
            report.attempts.iter().take(2).map(|a| a.detection_type).collect();
        assert_eq!(kinds, [DetectionKind::Single, DetectionKind::Multi]);
        assert_eq!(
            report.attempts.last().unwrap().enhancement,
            Enhancement::ComboClaheUpscale
        );
    }

    #[test]
    fn empty_payloads_are_not_a_success() {
        let detector = MockDetector::new(40, None, vec![square("", 0.0, 0.0, 10.0)]);
        let scanner =
            Scanner::with_detector(ScanProfile::Standard, ScannerConfig::default(), detector);
        let report = scanner.scan_gray(&frame(), "frame");
        assert_eq!(report.attempts.len(), 1);
        assert!(report.attempts[0].detected);
        assert_eq!(report.attempts[0].count, 1);
        assert!(!report.attempts[0].success);
        assert_eq!(report.modules_detected, 0);
    }

    #[test]
    fn duplicates_are_collapsed_and_ids_sequential() {
        let found = vec![
            square("A", 0.0, 0.0, 10.0),
            square("A", 2.0, 1.0, 10.0),
            square("", 5.0, 5.0, 10.0),
            square("{\"device_id\": \"B\", \"type\": \"relay\"}", 25.0, 0.0, 10.0),
        ];
        let detector = MockDetector::new(40, None, found);
        let scanner = Scanner::with_detector(ScanProfile::Web, ScannerConfig::default(), detector);
        let report = scanner.scan_gray(&frame(), "frame");
        assert_eq!(report.modules_detected, 2);
        assert_eq!(report.modules[0].module_id, 1);
        assert_eq!(report.modules[1].module_id, 2);
        assert_eq!(report.modules[1].device_info["type"], "relay");
        assert_eq!(report.attempts[0].count, 4);
    }

    #[test]
    fn enhanced_profile_counts_regions() {
        let detector = MockDetector::new(0, None, Vec::new());
        let scanner =
            Scanner::with_detector(ScanProfile::Enhanced, ScannerConfig::default(), detector);
        let report = scanner.scan_gray(&frame(), "frame");
        assert_eq!(report.potential_qr_regions, Some(0));
        assert_eq!(report.attempts.len(), 4);
        assert!(report.attempts.iter().all(|a| a.detection_type == DetectionKind::Multi));
    }

    #[test]
    fn downscaled_frame_maps_to_original_coordinates() {
        let config = ScannerConfig {
            max_dimension: Some(20),
            ..ScannerConfig::default()
        };
        // 40x30 becomes 20x15
        let detector = MockDetector::new(20, None, vec![square("X", 5.0, 5.0, 4.0)]);
        let scanner = Scanner::with_detector(ScanProfile::Standard, config, detector);
        let report = scanner.scan_gray(&frame(), "frame");
        assert_eq!(report.frame_dimensions, FrameDimensions::new(40, 30));
        assert_eq!(report.attempts[0].image_size, "20x15");
        assert_eq!(
            report.modules[0].position.bounding_box,
            BoundingBox::from_extents(10, 10, 18, 18)
        );
    }

    #[test]
    fn scan_rgb_checks_buffer_size() {
        let scanner = Scanner::with_detector(
            ScanProfile::Standard,
            ScannerConfig::default(),
            MockDetector::new(0, None, Vec::new()),
        );
        assert!(scanner.scan_rgb(&[0u8; 10], 2, 2, "cam").is_err());
        let report = scanner.scan_rgb(&[128u8; 12], 2, 2, "cam").unwrap();
        assert_eq!(report.frame_dimensions, FrameDimensions::new(2, 2));
        assert_eq!(report.source, "cam");
    }

    #[test]
    fn batch_keeps_order_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        frame().save(&good).unwrap();
        let missing = dir.path().join("missing.png");

        let detector = MockDetector::new(40, None, vec![square("A", 0.0, 0.0, 10.0)]);
        let scanner =
            Scanner::with_detector(ScanProfile::Standard, ScannerConfig::default(), detector);
        let outcomes = scanner.scan_paths(&[good, missing.clone()]);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].modules_detected(), 1);
        match &outcomes[1] {
            BatchOutcome::Failed(err) => {
                assert!(err.error.starts_with("Could not load image from"));
                assert_eq!(err.source.as_deref(), Some(missing.display().to_string().as_str()));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn web_profile_falls_back_to_cubic_upscale() {
        let detector = MockDetector::new(0, None, Vec::new());
        let scanner = Scanner::with_detector(ScanProfile::Web, ScannerConfig::default(), detector);
        let report = scanner.scan_gray(&frame(), "frame");
        let sizes: Vec<&str> = report.attempts.iter().map(|a| a.image_size.as_str()).collect();
        assert_eq!(sizes, ["40x30", "80x60"]);
    }
}
