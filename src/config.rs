//! Tunable parameters for enhancement filters, region search and input sizing.
//!
//! Every field has a default, so a JSON file only needs the values it changes:
//!
//! ```no_run
//! use qr_frame_scanner::ScannerConfig;
//! use std::path::Path;
//!
//! let mut config = ScannerConfig::from_json_file(Path::new("scanner.json"))?;
//! config.apply_env_overrides();
//! # Ok::<(), qr_frame_scanner::ScanError>(())
//! ```
//!
//! Environment overrides:
//! - `QR_MAX_DIM`: downscale frames whose longest side exceeds this (0 disables)
//! - `QR_UPSCALE_FACTOR`: factor used by the upscaling enhancements (1 to
//!   [`MAX_UPSCALE_FACTOR`])

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Largest accepted `upscale_factor`
pub const MAX_UPSCALE_FACTOR: u32 = 8;

/// Complete scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Enhancement filter parameters
    pub enhance: EnhanceConfig,

    /// Potential-region search parameters
    pub regions: RegionConfig,

    /// Longest side a frame may have before it is downscaled for detection.
    /// Reported coordinates always refer to the original frame.
    pub max_dimension: Option<u32>,
}

/// Parameters of the fixed enhancement filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Factor applied by the upscaling enhancements
    pub upscale_factor: u32,

    /// Non-local-means denoising
    pub denoise: DenoiseConfig,

    /// CLAHE clip limit for the plain `clahe` enhancement
    pub clahe_clip_limit: f32,

    /// CLAHE clip limit used before upscaling in `combo_clahe_upscale`
    pub combo_clahe_clip_limit: f32,

    /// CLAHE tile grid (tiles per axis)
    pub clahe_tiles: u32,

    /// Side of the square structuring element for opening/closing
    pub morph_kernel: u32,

    /// Gaussian sigma of the unsharp mask in `edge_enhanced`
    pub edge_sigma: f32,

    /// Weight of the source image in `edge_enhanced`
    pub edge_weight: f32,

    /// Weight of the blurred image in `edge_enhanced`
    pub edge_blur_weight: f32,

    /// Bilateral filter diameter in pixels
    pub bilateral_diameter: u32,

    /// Bilateral filter range sigma
    pub bilateral_sigma_color: f32,

    /// Bilateral filter spatial sigma
    pub bilateral_sigma_space: f32,

    /// Adaptive threshold block size (odd)
    pub adaptive_block_size: u32,

    /// Constant subtracted from the local mean before thresholding
    pub adaptive_offset: i32,

    /// Median blur radius (1 gives a 3x3 window)
    pub median_radius: u32,

    /// Gain of `contrast_enhanced`
    pub contrast_alpha: f32,

    /// Bias of `contrast_enhanced`
    pub contrast_beta: f32,
}

/// Non-local-means denoising parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Filter strength; larger removes more noise and more detail
    pub strength: f32,

    /// Radius of the compared patches
    pub patch_radius: u32,

    /// Radius of the window searched for similar patches
    pub search_radius: u32,
}

/// Potential-region filters and the code clustering used for multi-code reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Minimum enclosed area in pixels
    pub min_area: usize,

    /// Minimum width/height ratio
    pub min_aspect: f32,

    /// Maximum width/height ratio
    pub max_aspect: f32,

    /// Side of the squares dark pixels are grouped by; gaps up to about this
    /// size stay inside one cluster
    pub cluster_cell: u32,

    /// Most clusters read separately per multi-code detection (0 disables)
    pub max_clusters: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enhance: EnhanceConfig::default(),
            regions: RegionConfig::default(),
            max_dimension: None,
        }
    }
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            upscale_factor: 2,
            denoise: DenoiseConfig::default(),
            clahe_clip_limit: 2.0,
            combo_clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            morph_kernel: 2,
            edge_sigma: 1.0,
            edge_weight: 1.5,
            edge_blur_weight: -0.5,
            bilateral_diameter: 9,
            bilateral_sigma_color: 75.0,
            bilateral_sigma_space: 75.0,
            adaptive_block_size: 11,
            adaptive_offset: 2,
            median_radius: 1,
            contrast_alpha: 1.5,
            contrast_beta: 0.0,
        }
    }
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            strength: 3.0,
            patch_radius: 1,
            search_radius: 5,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            min_area: 1000,
            min_aspect: 0.8,
            max_aspect: 1.2,
            cluster_cell: 8,
            max_clusters: 8,
        }
    }
}

impl ScannerConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QR_MAX_DIM` / `QR_UPSCALE_FACTOR` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; unparsable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("QR_MAX_DIM") {
            match value.trim().parse::<u32>() {
                Ok(0) => self.max_dimension = None,
                Ok(v) => self.max_dimension = Some(v),
                Err(_) => log::warn!("ignoring QR_MAX_DIM={value:?}"),
            }
        }
        if let Some(value) = lookup("QR_UPSCALE_FACTOR") {
            match value.trim().parse::<u32>() {
                Ok(v) if (1..=MAX_UPSCALE_FACTOR).contains(&v) => self.enhance.upscale_factor = v,
                _ => log::warn!("ignoring QR_UPSCALE_FACTOR={value:?}"),
            }
        }
    }

    /// Reject values the filters cannot work with.
    pub fn validate(&self) -> Result<()> {
        let e = &self.enhance;
        if !(1..=MAX_UPSCALE_FACTOR).contains(&e.upscale_factor) {
            return Err(ScanError::config(format!(
                "upscale_factor must be between 1 and {MAX_UPSCALE_FACTOR}"
            )));
        }
        if e.adaptive_block_size < 3 || e.adaptive_block_size % 2 == 0 {
            return Err(ScanError::config(
                "adaptive_block_size must be odd and at least 3",
            ));
        }
        if e.clahe_tiles == 0 {
            return Err(ScanError::config("clahe_tiles must be at least 1"));
        }
        if e.morph_kernel == 0 {
            return Err(ScanError::config("morph_kernel must be at least 1"));
        }
        if e.edge_sigma <= 0.0 {
            return Err(ScanError::config("edge_sigma must be positive"));
        }
        if e.denoise.strength <= 0.0 {
            return Err(ScanError::config("denoise.strength must be positive"));
        }
        if self.regions.min_aspect > self.regions.max_aspect {
            return Err(ScanError::config("regions.min_aspect exceeds max_aspect"));
        }
        if self.regions.cluster_cell == 0 {
            return Err(ScanError::config("regions.cluster_cell must be at least 1"));
        }
        if self.max_dimension == Some(0) {
            return Err(ScanError::config("max_dimension must be positive"));
        }
        Ok(())
    }
}
