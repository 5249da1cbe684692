//! Resampling and neighbourhood filters

use crate::config::MAX_UPSCALE_FACTOR;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use log::warn;
use rayon::prelude::*;

/// 3x3 sharpening kernel: centre 9, neighbours -1
pub const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Enlarge both sides by `factor` with the given interpolation.
///
/// Factors above [`MAX_UPSCALE_FACTOR`] are clamped.
pub fn upscale(gray: &GrayImage, factor: u32, filter: FilterType) -> GrayImage {
    let factor = factor.min(MAX_UPSCALE_FACTOR);
    if factor <= 1 {
        return gray.clone();
    }
    match (
        gray.width().checked_mul(factor),
        gray.height().checked_mul(factor),
    ) {
        (Some(width), Some(height)) => imageops::resize(gray, width, height, filter),
        _ => {
            warn!(
                "{}x{} frame is too large to upscale by {factor}",
                gray.width(),
                gray.height()
            );
            gray.clone()
        }
    }
}

/// Apply [`SHARPEN_KERNEL`]
pub fn sharpen(gray: &GrayImage) -> GrayImage {
    convolve3x3(gray, &SHARPEN_KERNEL)
}

/// 3x3 convolution with reflected borders (`gfedcb|abcdefgh|gfedcba`),
/// rounded and saturated to `u8`
pub fn convolve3x3(gray: &GrayImage, kernel: &[f32; 9]) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    let (w, h) = (width as i64, height as i64);

    out.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for (x, dst) in row.iter_mut().enumerate() {
                let x = x as i64;
                let mut acc = 0.0f32;
                for ky in 0..3 {
                    let sy = reflect101(y + ky - 1, h);
                    for kx in 0..3 {
                        let sx = reflect101(x + kx - 1, w);
                        acc += kernel[(ky * 3 + kx) as usize]
                            * gray.get_pixel(sx as u32, sy as u32).0[0] as f32;
                    }
                }
                *dst = saturate(acc);
            }
        });
    out
}

/// Median over a `(2r+1)` square window
pub fn median(gray: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return gray.clone();
    }
    median_filter(gray, radius, radius)
}

/// `weight * src + blur_weight * gaussian(src, sigma)`, saturated
pub fn unsharp(gray: &GrayImage, sigma: f32, weight: f32, blur_weight: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let src = gray.get_pixel(x, y).0[0] as f32;
        let blur = blurred.get_pixel(x, y).0[0] as f32;
        Luma([saturate(weight * src + blur_weight * blur)])
    })
}

/// Edge-preserving smoothing.
///
/// Each output pixel is the average of the pixels within `diameter / 2`
/// (inside a disc), weighted by a spatial gaussian and by a gaussian of the
/// intensity difference to the centre pixel.
pub fn bilateral(gray: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    let radius = (diameter / 2).max(1) as i64;
    let (w, h) = (width as i64, height as i64);

    let space_coeff = -0.5 / (sigma_space * sigma_space).max(f32::EPSILON);
    let color_coeff = -0.5 / (sigma_color * sigma_color).max(f32::EPSILON);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = (dx * dx + dy * dy) as f32;
            if d2 <= (radius * radius) as f32 {
                offsets.push((dx, dy, (d2 * space_coeff).exp()));
            }
        }
    }
    let color_lut: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    out.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for (x, dst) in row.iter_mut().enumerate() {
                let x = x as i64;
                let centre = gray.get_pixel(x as u32, y as u32).0[0] as i32;
                let mut sum = 0.0f32;
                let mut norm = 0.0f32;
                for &(dx, dy, space_weight) in &offsets {
                    let sx = reflect101(x + dx, w);
                    let sy = reflect101(y + dy, h);
                    let v = gray.get_pixel(sx as u32, sy as u32).0[0] as i32;
                    let weight = space_weight * color_lut[(v - centre).unsigned_abs() as usize];
                    sum += weight * v as f32;
                    norm += weight;
                }
                *dst = saturate(sum / norm);
            }
        });
    out
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge
pub(crate) fn reflect101(i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let m = i.rem_euclid(period);
    if m < len { m } else { period - m }
}

#[inline]
pub(crate) fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
