/// Raw frame to grayscale conversion
/// Y = 0.299*R + 0.587*G + 0.114*B
/// Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use crate::error::{Result, ScanError};
use image::{DynamicImage, GrayImage};
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Frames at least this many pixels are converted row-parallel
const PARALLEL_THRESHOLD: usize = 640 * 480;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8) as u8
}

/// Convert interleaved RGB (3 bytes per pixel) to grayscale
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    interleaved_to_grayscale(rgb, width, height, 3)
}

/// Convert interleaved RGBA (4 bytes per pixel) to grayscale, ignoring alpha
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    interleaved_to_grayscale(rgba, width, height, 4)
}

fn interleaved_to_grayscale(data: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut gray = vec![0u8; pixel_count];
    if pixel_count == 0 {
        return gray;
    }

    let convert_row = |(row, out): (usize, &mut [u8])| {
        let src = &data[row * width * channels..(row + 1) * width * channels];
        for (dst, px) in out.iter_mut().zip(src.chunks_exact(channels)) {
            *dst = luma(px[0], px[1], px[2]);
        }
    };

    if pixel_count >= PARALLEL_THRESHOLD {
        gray.par_chunks_mut(width).enumerate().for_each(convert_row);
    } else {
        gray.chunks_mut(width).enumerate().for_each(convert_row);
    }
    gray
}

/// Build a grayscale frame from a raw interleaved buffer with 1, 3 or 4 channels
pub fn frame_to_gray(data: &[u8], width: usize, height: usize, channels: usize) -> Result<GrayImage> {
    let expected = width * height * channels;
    if !matches!(channels, 1 | 3 | 4) || data.len() != expected {
        return Err(ScanError::FrameSize {
            width,
            height,
            expected,
            actual: data.len(),
        });
    }

    let gray = match channels {
        1 => data.to_vec(),
        3 => rgb_to_grayscale(data, width, height),
        _ => rgba_to_grayscale(data, width, height),
    };

    GrayImage::from_raw(width as u32, height as u32, gray).ok_or(ScanError::FrameSize {
        width,
        height,
        expected,
        actual: data.len(),
    })
}

/// Grayscale copy of a decoded image using the same weights as raw frames
pub fn image_to_gray(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut gray = GrayImage::new(width, height);
    gray.copy_from_slice(&rgb_to_grayscale(rgb.as_raw(), width as usize, height as usize));
    gray
}
