//! Side-by-side runs of the `enhanced` and `low_res` profiles over a set of images.

use crate::config::ScannerConfig;
use crate::error::Result;
use crate::models::FrameDimensions;
use crate::pipeline::{ScanProfile, Scanner};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of one scanner on one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerRun {
    /// Modules found
    pub detected: usize,
    /// Wall time, rounded to 10 ms
    pub time_seconds: f64,
    /// At least one module found
    pub success: bool,
}

impl ScannerRun {
    fn new(detected: usize, seconds: f64) -> Self {
        Self {
            detected,
            time_seconds: round_to(seconds, 2),
            success: detected > 0,
        }
    }
}

/// Which scanners read the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Both found codes
    BothSucceeded,
    /// Only the low-resolution scanner found codes
    OnlyLowRes,
    /// Only the standard scanner found codes
    OnlyStandard,
    /// Neither found codes
    BothFailed,
}

impl Verdict {
    /// Classify a pair of runs
    pub fn classify(standard: &ScannerRun, low_res: &ScannerRun) -> Self {
        match (standard.success, low_res.success) {
            (true, true) => Verdict::BothSucceeded,
            (false, true) => Verdict::OnlyLowRes,
            (true, false) => Verdict::OnlyStandard,
            (false, false) => Verdict::BothFailed,
        }
    }
}

/// Comparison of one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    /// File stem
    pub name: String,
    /// Image path
    pub path: String,
    /// `WxH`
    pub dimensions: String,
    /// File size in KiB, one decimal
    pub file_size_kb: f64,
    /// Run with the `enhanced` profile
    pub standard_scanner: ScannerRun,
    /// Run with the `low_res` profile
    pub lowres_scanner: ScannerRun,
    /// Classification of the two runs
    pub verdict: Verdict,
}

/// Runs both scanners over images
#[derive(Debug)]
pub struct ResolutionComparison {
    standard: Scanner,
    low_res: Scanner,
}

impl ResolutionComparison {
    /// `enhanced` against `low_res`, sharing one configuration
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            standard: Scanner::with_config(ScanProfile::Enhanced, config.clone()),
            low_res: Scanner::with_config(ScanProfile::LowRes, config),
        }
    }

    /// Compare arbitrary scanners
    pub fn with_scanners(standard: Scanner, low_res: Scanner) -> Self {
        Self { standard, low_res }
    }

    /// Load `path` once and time both scanners on it
    pub fn compare(&self, path: &Path) -> Result<ComparisonEntry> {
        let image = crate::tools::load_image(path)?;
        let file_size = fs::metadata(path)?.len();
        let source = path.display().to_string();

        let started = Instant::now();
        let standard = self.standard.scan_image(&image, &source);
        let standard_run = ScannerRun::new(standard.modules_detected, started.elapsed().as_secs_f64());

        let started = Instant::now();
        let low_res = self.low_res.scan_image(&image, &source);
        let low_res_run = ScannerRun::new(low_res.modules_detected, started.elapsed().as_secs_f64());

        let verdict = Verdict::classify(&standard_run, &low_res_run);
        info!(
            "{source}: {} = {}, {} = {} ({verdict:?})",
            self.standard.profile(),
            standard_run.detected,
            self.low_res.profile(),
            low_res_run.detected
        );

        Ok(ComparisonEntry {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.clone()),
            path: source,
            dimensions: FrameDimensions::of(&image).to_string(),
            file_size_kb: round_to(file_size as f64 / 1024.0, 1),
            standard_scanner: standard_run,
            lowres_scanner: low_res_run,
            verdict,
        })
    }

    /// Compare every image; ones that fail to load are logged and skipped
    pub fn compare_all(&self, paths: &[PathBuf]) -> Vec<ComparisonEntry> {
        paths
            .iter()
            .filter_map(|path| match self.compare(path) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("{err}");
                    None
                }
            })
            .collect()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{DetectionKind, QrDetector, RawDetection};
    use crate::models::Point;
    use image::{GrayImage, Luma};

    /// Finds a code only in images at least `min_width` wide
    struct WidthGate(u32);

    impl QrDetector for WidthGate {
        fn name(&self) -> &str {
            "width-gate"
        }

        fn detect(&self, image: &GrayImage, _kind: DetectionKind) -> Vec<RawDetection> {
            if image.width() < self.0 {
                return Vec::new();
            }
            vec![RawDetection {
                content: "MODULE_001".to_string(),
                corners: [
                    Point::new(0.0, 0.0),
                    Point::new(8.0, 0.0),
                    Point::new(8.0, 8.0),
                    Point::new(0.0, 8.0),
                ],
                symbol: None,
            }]
        }
    }

    fn comparison(min_width: u32) -> ResolutionComparison {
        ResolutionComparison::with_scanners(
            Scanner::with_detector(ScanProfile::Enhanced, ScannerConfig::default(), WidthGate(min_width)),
            Scanner::with_detector(ScanProfile::LowRes, ScannerConfig::default(), WidthGate(min_width)),
        )
    }

    #[test]
    fn verdicts() {
        let yes = ScannerRun::new(2, 0.5);
        let no = ScannerRun::new(0, 0.5);
        assert_eq!(Verdict::classify(&yes, &yes), Verdict::BothSucceeded);
        assert_eq!(Verdict::classify(&no, &yes), Verdict::OnlyLowRes);
        assert_eq!(Verdict::classify(&yes, &no), Verdict::OnlyStandard);
        assert_eq!(Verdict::classify(&no, &no), Verdict::BothFailed);
    }

    #[test]
    fn rounding() {
        assert_eq!(ScannerRun::new(1, 1.23456).time_seconds, 1.23);
        assert_eq!(round_to(2.04999, 1), 2.0);
    }

    #[test]
    fn low_res_wins_on_small_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_low.png");
        GrayImage::from_pixel(30, 20, Luma([255])).save(&path).unwrap();

        // only the 2x upscales are wide enough
        let entry = comparison(60).compare(&path).unwrap();
        assert_eq!(entry.name, "frame_low");
        assert_eq!(entry.dimensions, "30x20");
        assert!(entry.file_size_kb >= 0.0);
        assert!(!entry.standard_scanner.success);
        assert!(entry.lowres_scanner.success);
        assert_eq!(entry.verdict, Verdict::OnlyLowRes);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["verdict"], "only_low_res");
    }

    #[test]
    fn unreadable_images_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("frame.png");
        GrayImage::from_pixel(30, 20, Luma([255])).save(&good).unwrap();
        let entries = comparison(1).compare_all(&[dir.path().join("missing.png"), good]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].verdict, Verdict::BothSucceeded);
    }
}
