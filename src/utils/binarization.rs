use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Adaptive threshold against the mean of a `block_size` square window.
///
/// A pixel becomes white (255) when it is brighter than the local mean minus
/// `offset`, black (0) otherwise. The window is clipped at the image border.
pub fn adaptive_threshold_mean(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let (w, h) = (width as usize, height as usize);
    let radius = (block_size / 2) as usize;

    // Integral image with a zero guard row/column
    let stride = w + 1;
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += gray.get_pixel(x as u32, y as u32).0[0] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(w);
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((x1 - x0) * (y1 - y0)) as u64;
            let mean = ((sum + count / 2) / count) as i32;
            let value = gray.get_pixel(x as u32, y as u32).0[0] as i32;
            out.put_pixel(x as u32, y as u32, binary_pixel(value > mean - offset));
        }
    }
    out
}

/// Adaptive threshold against a gaussian-weighted local mean.
///
/// The gaussian's sigma follows the usual block-size rule
/// `0.3 * ((block_size - 1) / 2 - 1) + 0.8`.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    let sigma = gaussian_sigma_for_block(block_size);
    let mean = gaussian_blur_f32(gray, sigma);

    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let local = mean.get_pixel(x, y).0[0] as i32;
        out.put_pixel(x, y, binary_pixel(pixel.0[0] as i32 > local - offset));
    }
    out
}

fn gaussian_sigma_for_block(block_size: u32) -> f32 {
    let half = (block_size.max(3) as f32 - 1.0) * 0.5;
    (0.3 * (half - 1.0) + 0.8).max(0.1)
}

fn binary_pixel(white: bool) -> Luma<u8> {
    if white { Luma([255]) } else { Luma([0]) }
}
