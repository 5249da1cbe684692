//! Fixed enhancement filters tried before repeated detection attempts.
//!
//! Each [`Enhancement`] maps a grayscale frame to a new grayscale frame. The
//! upscaling variants change the image size; the scanner maps coordinates
//! back using the width ratio.

pub mod contrast;
pub mod denoise;
pub mod filters;
pub mod morphology;

use crate::config::EnhanceConfig;
use crate::utils::binarization::{adaptive_threshold_gaussian, adaptive_threshold_mean};
use image::GrayImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One fixed preprocessing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enhancement {
    /// Grayscale frame as is
    Original,
    /// Bilinear upscale
    UpscaleLinear,
    /// Bicubic (Catmull-Rom) upscale
    UpscaleCubic,
    /// Lanczos3 upscale
    UpscaleLanczos,
    /// Non-local-means denoising
    Denoised,
    /// Global histogram equalisation
    HistEq,
    /// Contrast-limited adaptive histogram equalisation
    Clahe,
    /// 3x3 sharpening kernel
    Sharpened,
    /// Grayscale closing
    MorphClose,
    /// Grayscale opening
    MorphOpen,
    /// Unsharp mask
    EdgeEnhanced,
    /// Edge-preserving bilateral smoothing
    Bilateral,
    /// Adaptive threshold, box mean
    AdaptiveThreshMean,
    /// Adaptive threshold, gaussian mean
    AdaptiveThreshGaussian,
    /// Denoise, cubic upscale, sharpen
    ComboDenoiseUpscaleSharpen,
    /// Stronger CLAHE, cubic upscale
    ComboClaheUpscale,
    /// 3x3 median blur
    BlurReduced,
    /// Linear contrast stretch
    ContrastEnhanced,
}

impl Enhancement {
    /// Every enhancement, low-resolution plan order first
    pub const ALL: [Enhancement; 18] = [
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
        Enhancement::BlurReduced,
        Enhancement::ContrastEnhanced,
    ];

    /// Stable snake_case name, as used in reports
    pub fn name(self) -> &'static str {
        match self {
            Enhancement::Original => "original",
            Enhancement::UpscaleLinear => "upscale_linear",
            Enhancement::UpscaleCubic => "upscale_cubic",
            Enhancement::UpscaleLanczos => "upscale_lanczos",
            Enhancement::Denoised => "denoised",
            Enhancement::HistEq => "hist_eq",
            Enhancement::Clahe => "clahe",
            Enhancement::Sharpened => "sharpened",
            Enhancement::MorphClose => "morph_close",
            Enhancement::MorphOpen => "morph_open",
            Enhancement::EdgeEnhanced => "edge_enhanced",
            Enhancement::Bilateral => "bilateral",
            Enhancement::AdaptiveThreshMean => "adaptive_thresh_mean",
            Enhancement::AdaptiveThreshGaussian => "adaptive_thresh_gaussian",
            Enhancement::ComboDenoiseUpscaleSharpen => "combo_denoise_upscale_sharpen",
            Enhancement::ComboClaheUpscale => "combo_clahe_upscale",
            Enhancement::BlurReduced => "blur_reduced",
            Enhancement::ContrastEnhanced => "contrast_enhanced",
        }
    }

    /// Whether the output is larger than the input
    pub fn upscales(self) -> bool {
        matches!(
            self,
            Enhancement::UpscaleLinear
                | Enhancement::UpscaleCubic
                | Enhancement::UpscaleLanczos
                | Enhancement::ComboDenoiseUpscaleSharpen
                | Enhancement::ComboClaheUpscale
        )
    }

    /// Apply the filter
    pub fn apply(self, gray: &GrayImage, config: &EnhanceConfig) -> GrayImage {
        if gray.width() == 0 || gray.height() == 0 {
            return gray.clone();
        }
        let factor = config.upscale_factor;

        match self {
            Enhancement::Original => gray.clone(),
            Enhancement::UpscaleLinear => filters::upscale(gray, factor, FilterType::Triangle),
            Enhancement::UpscaleCubic => filters::upscale(gray, factor, FilterType::CatmullRom),
            Enhancement::UpscaleLanczos => filters::upscale(gray, factor, FilterType::Lanczos3),
            Enhancement::Denoised => denoise::non_local_means(gray, &config.denoise),
            Enhancement::HistEq => contrast::equalize(gray),
            Enhancement::Clahe => {
                contrast::clahe(gray, config.clahe_clip_limit, config.clahe_tiles)
            }
            Enhancement::Sharpened => filters::sharpen(gray),
            Enhancement::MorphClose => morphology::close(gray, config.morph_kernel),
            Enhancement::MorphOpen => morphology::open(gray, config.morph_kernel),
            Enhancement::EdgeEnhanced => filters::unsharp(
                gray,
                config.edge_sigma,
                config.edge_weight,
                config.edge_blur_weight,
            ),
            Enhancement::Bilateral => filters::bilateral(
                gray,
                config.bilateral_diameter,
                config.bilateral_sigma_color,
                config.bilateral_sigma_space,
            ),
            Enhancement::AdaptiveThreshMean => {
                adaptive_threshold_mean(gray, config.adaptive_block_size, config.adaptive_offset)
            }
            Enhancement::AdaptiveThreshGaussian => adaptive_threshold_gaussian(
                gray,
                config.adaptive_block_size,
                config.adaptive_offset,
            ),
            Enhancement::ComboDenoiseUpscaleSharpen => {
                let denoised = denoise::non_local_means(gray, &config.denoise);
                let upscaled = filters::upscale(&denoised, factor, FilterType::CatmullRom);
                filters::sharpen(&upscaled)
            }
            Enhancement::ComboClaheUpscale => {
                let equalized =
                    contrast::clahe(gray, config.combo_clahe_clip_limit, config.clahe_tiles);
                filters::upscale(&equalized, factor, FilterType::CatmullRom)
            }
            Enhancement::BlurReduced => filters::median(gray, config.median_radius),
            Enhancement::ContrastEnhanced => {
                contrast::scale_abs(gray, config.contrast_alpha, config.contrast_beta)
            }
        }
    }
}

impl fmt::Display for Enhancement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Enhancement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Enhancement::ALL
            .iter()
            .copied()
            .find(|e| e.name() == normalized)
            .ok_or_else(|| format!("unknown enhancement '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]))
    }

    #[test]
    fn names_roundtrip() {
        for e in Enhancement::ALL {
            assert_eq!(e.name().parse::<Enhancement>().unwrap(), e);
            assert_eq!(
                serde_json::to_string(&e).unwrap(),
                format!("\"{}\"", e.name())
            );
        }
        assert_eq!(
            "Upscale-Cubic".parse::<Enhancement>().unwrap(),
            Enhancement::UpscaleCubic
        );
        assert!("sepia".parse::<Enhancement>().is_err());
    }

    #[test]
    fn output_sizes() {
        let config = EnhanceConfig::default();
        let gray = gradient(24, 16);
        for e in Enhancement::ALL {
            let out = e.apply(&gray, &config);
            if e.upscales() {
                assert_eq!(out.dimensions(), (48, 32), "{e}");
            } else {
                assert_eq!(out.dimensions(), (24, 16), "{e}");
            }
        }
    }

    #[test]
    fn original_is_identity() {
        let gray = gradient(8, 8);
        assert_eq!(Enhancement::Original.apply(&gray, &EnhanceConfig::default()), gray);
    }

    #[test]
    fn empty_image_passes_through() {
        let gray = GrayImage::new(0, 0);
        for e in Enhancement::ALL {
            assert_eq!(e.apply(&gray, &EnhanceConfig::default()).dimensions(), (0, 0));
        }
    }

    #[test]
    fn thresholds_are_binary() {
        let gray = gradient(32, 32);
        let config = EnhanceConfig::default();
        for e in [
            Enhancement::AdaptiveThreshMean,
            Enhancement::AdaptiveThreshGaussian,
        ] {
            let out = e.apply(&gray, &config);
            assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255), "{e}");
        }
    }
}
