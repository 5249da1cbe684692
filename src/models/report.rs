use super::{BoundingBox, PointI};
use crate::detector::{DetectionKind, SymbolInfo};
use crate::enhance::Enhancement;
use crate::pipeline::ScanProfile;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Width and height of a frame in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FrameDimensions {
    /// Create frame dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of any `image` buffer
    pub fn of<I: image::GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }
}

impl std::fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where a module sits in the original frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulePosition {
    /// Mean of the four corners
    pub center: PointI,
    /// Axis-aligned box around the corners
    pub bounding_box: BoundingBox,
    /// Corners in detector order
    pub corners: [PointI; 4],
}

/// One detected QR code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedModule {
    /// 1-based, sequential over the modules of one report
    pub module_id: usize,
    /// Enhancement that made the code readable
    pub enhancement: Enhancement,
    /// Detection mode that found it
    pub detection_type: DetectionKind,
    /// Pixel position in the original frame
    pub position: ModulePosition,
    /// Decoded text
    pub qr_code_data: String,
    /// Payload parsed as a JSON object, or `{"device_id": <text>}`
    pub device_info: Map<String, Value>,
    /// Version, ECC level and mask when the detector reports them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolInfo>,
}

impl DetectedModule {
    /// The payload's device identifier, if it has one
    pub fn device_id(&self) -> Option<String> {
        crate::payload::device_id(&self.device_info)
    }
}

/// One detector call on one enhanced image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Enhancement applied before the call
    pub enhancement: Enhancement,
    /// Detection mode used
    pub detection_type: DetectionKind,
    /// The detector located at least one code
    pub detected: bool,
    /// Codes the detector returned
    pub count: usize,
    /// Size of the enhanced image, `WxH`
    pub image_size: String,
    /// At least one code with non-empty data was accepted
    pub success: bool,
}

/// Result of scanning one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Local time the scan started, ISO 8601 without offset
    pub timestamp: String,
    /// File path or label of the frame
    pub source: String,
    /// Retry plan used
    pub profile: ScanProfile,
    /// Size of the original frame
    pub frame_dimensions: FrameDimensions,
    /// Always equal to `modules.len()`
    pub modules_detected: usize,
    /// Detected codes
    pub modules: Vec<DetectedModule>,
    /// Every detector call, in order
    pub attempts: Vec<AttemptRecord>,
    /// Square-ish dark regions found by the region search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_qr_regions: Option<usize>,
}

impl ScanReport {
    /// Empty report stamped with the current local time
    pub fn new(source: impl Into<String>, profile: ScanProfile, dims: FrameDimensions) -> Self {
        Self {
            timestamp: timestamp_now(),
            source: source.into(),
            profile,
            frame_dimensions: dims,
            modules_detected: 0,
            modules: Vec::new(),
            attempts: Vec::new(),
            potential_qr_regions: None,
        }
    }

    /// Append a module, assigning the next id
    pub fn push_module(
        &mut self,
        enhancement: Enhancement,
        detection_type: DetectionKind,
        position: ModulePosition,
        qr_code_data: String,
        device_info: Map<String, Value>,
        symbol: Option<SymbolInfo>,
    ) -> &DetectedModule {
        let module_id = self.modules.len() + 1;
        self.modules.push(DetectedModule {
            module_id,
            enhancement,
            detection_type,
            position,
            qr_code_data,
            device_info,
            symbol,
        });
        self.modules_detected = self.modules.len();
        &self.modules[module_id - 1]
    }

    /// Enhancement of the successful attempt, if any
    pub fn winning_attempt(&self) -> Option<&AttemptRecord> {
        self.attempts.iter().find(|a| a.success)
    }
}

/// JSON body emitted instead of a report when scanning fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human readable message
    pub error: String,
    /// Frame the error belongs to (batch runs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ErrorReport {
    /// Error report for a failed scan
    pub fn new(error: &crate::ScanError, source: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            source,
        }
    }
}

/// Local time formatted like `2024-05-01T13:45:10.123456`
pub fn timestamp_now() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
