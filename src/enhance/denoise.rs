//! Non-local-means denoising for single-channel frames

use super::filters::saturate;
use crate::config::DenoiseConfig;
use image::GrayImage;
use rayon::prelude::*;

/// Replace each pixel with a weighted mean of pixels whose surrounding patch
/// looks similar.
///
/// Patches are `(2 * patch_radius + 1)` squares compared by mean squared
/// difference over a `(2 * search_radius + 1)` window; a candidate's weight is
/// `exp(-d / strength^2)`. Coordinates outside the frame are clamped.
pub fn non_local_means(gray: &GrayImage, config: &DenoiseConfig) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let (w, h) = (width as i64, height as i64);
    let patch = config.patch_radius as i64;
    let search = config.search_radius as i64;
    let h2 = (config.strength * config.strength).max(f32::EPSILON);
    let patch_area = ((2 * patch + 1) * (2 * patch + 1)) as f32;

    let src = gray.as_raw();
    let at = |x: i64, y: i64| -> f32 {
        let cx = x.clamp(0, w - 1);
        let cy = y.clamp(0, h - 1);
        src[(cy * w + cx) as usize] as f32
    };

    out.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for (x, dst) in row.iter_mut().enumerate() {
                let x = x as i64;
                let mut sum = 0.0f32;
                let mut norm = 0.0f32;

                for sy in (y - search).max(0)..=(y + search).min(h - 1) {
                    for sx in (x - search).max(0)..=(x + search).min(w - 1) {
                        let mut dist = 0.0f32;
                        for py in -patch..=patch {
                            for px in -patch..=patch {
                                let d = at(x + px, y + py) - at(sx + px, sy + py);
                                dist += d * d;
                            }
                        }
                        let weight = (-(dist / patch_area) / h2).exp();
                        sum += weight * at(sx, sy);
                        norm += weight;
                    }
                }
                *dst = saturate(sum / norm);
            }
        });
    out
}
