//! Histogram and intensity-mapping enhancements

use super::filters::reflect101;
use image::{GrayImage, Luma};

/// Global histogram equalisation
pub fn equalize(gray: &GrayImage) -> GrayImage {
    imageproc::contrast::equalize_histogram(gray)
}

/// Saturating `|alpha * v + beta|` per pixel
pub fn scale_abs(gray: &GrayImage, alpha: f32, beta: f32) -> GrayImage {
    let lut: Vec<u8> = (0..256)
        .map(|v| (alpha * v as f32 + beta).abs().round().min(255.0) as u8)
        .collect();
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([lut[gray.get_pixel(x, y).0[0] as usize]])
    })
}

/// Contrast-limited adaptive histogram equalisation.
///
/// The frame is split into `tiles` x `tiles` equal regions; when a side is not
/// a multiple of the grid, the frame is mirrored past its right and bottom
/// edges until it is. Each region gets its own equalisation curve with the
/// histogram clipped at `clip_limit * tile_area / 256` and the excess spread
/// evenly. Pixels blend the curves of the four nearest tile centres
/// bilinearly.
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let tiles_x = tiles.clamp(1, width) as usize;
    let tiles_y = tiles.clamp(1, height) as usize;
    let tile_w = (width as usize).div_ceil(tiles_x);
    let tile_h = (height as usize).div_ceil(tiles_y);

    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let tile = Tile {
                x0: tx * tile_w,
                y0: ty * tile_h,
                width: tile_w,
                height: tile_h,
            };
            luts[ty * tiles_x + tx] = tile_lut(gray, &tile, clip_limit);
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height as usize {
        let (ty0, ty1, wy) = neighbours(y, tile_h, tiles_y);
        for x in 0..width as usize {
            let (tx0, tx1, wx) = neighbours(x, tile_w, tiles_x);
            let v = gray.get_pixel(x as u32, y as u32).0[0] as usize;

            let top = lerp(
                luts[ty0 * tiles_x + tx0][v],
                luts[ty0 * tiles_x + tx1][v],
                wx,
            );
            let bottom = lerp(
                luts[ty1 * tiles_x + tx0][v],
                luts[ty1 * tiles_x + tx1][v],
                wx,
            );
            let value = top + (bottom - top) * wy;
            out.put_pixel(x as u32, y as u32, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Tile of the padded grid; may reach past the frame's right and bottom edges
struct Tile {
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
}

fn tile_lut(gray: &GrayImage, tile: &Tile, clip_limit: f32) -> [u8; 256] {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let mut histogram = [0u32; 256];
    for y in tile.y0..tile.y0 + tile.height {
        let sy = reflect101(y as i64, h) as u32;
        for x in tile.x0..tile.x0 + tile.width {
            let sx = reflect101(x as i64, w) as u32;
            histogram[gray.get_pixel(sx, sy).0[0] as usize] += 1;
        }
    }
    let area = (tile.width * tile.height).max(1) as u32;

    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for count in histogram.iter_mut() {
            if *count > clip {
                excess += *count - clip;
                *count = clip;
            }
        }
        let batch = excess / 256;
        let residual = (excess % 256) as usize;
        for count in histogram.iter_mut() {
            *count += batch;
        }
        if residual > 0 {
            let step = (256 / residual).max(1);
            for i in (0..256).step_by(step).take(residual) {
                histogram[i] += 1;
            }
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (i, &count) in histogram.iter().enumerate() {
        cdf += count;
        lut[i] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Indices of the two tiles around `pos` and the blend weight of the second
fn neighbours(pos: usize, tile: usize, count: usize) -> (usize, usize, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let lower = f.floor() as usize;
    if lower + 1 >= count {
        return (count - 1, count - 1, 0.0);
    }
    (lower, lower + 1, f - lower as f32)
}

fn lerp(a: u8, b: u8, t: f32) -> f32 {
    a as f32 + (b as f32 - a as f32) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_contrast(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([100 + ((x + y) % 20) as u8]))
    }

    fn range(image: &GrayImage) -> (u8, u8) {
        image.pixels().fold((255, 0), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])))
    }

    #[test]
    fn equalize_stretches_range() {
        let (lo, hi) = range(&equalize(&low_contrast(40, 40)));
        assert!(hi - lo > 200, "{lo}..{hi}");
    }

    #[test]
    fn scale_abs_saturates() {
        let gray = GrayImage::from_raw(3, 1, vec![10, 100, 200]).unwrap();
        let out = scale_abs(&gray, 1.5, 0.0);
        assert_eq!(out.into_raw(), vec![15, 150, 255]);
    }

    #[test]
    fn scale_abs_takes_absolute_value() {
        let gray = GrayImage::from_raw(2, 1, vec![10, 100]).unwrap();
        let out = scale_abs(&gray, -1.0, 0.0);
        assert_eq!(out.into_raw(), vec![10, 100]);
    }

    #[test]
    fn clahe_increases_contrast_but_is_limited() {
        let gray = low_contrast(64, 64);
        let limited = clahe(&gray, 2.0, 8);
        let (lo, hi) = range(&limited);
        assert!(hi - lo > 19, "{lo}..{hi}");

        let (elo, ehi) = range(&equalize(&gray));
        assert!(hi - lo <= ehi - elo);
    }

    #[test]
    fn clahe_on_flat_image_is_flat() {
        let gray = GrayImage::from_pixel(32, 32, Luma([90]));
        let out = clahe(&gray, 2.0, 8);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn clahe_on_flat_unaligned_frames_is_flat() {
        // 33 and 49 are not multiples of the 8-tile grid
        for side in [33, 49, 57] {
            let gray = GrayImage::from_pixel(side, side, Luma([90]));
            let out = clahe(&gray, 2.0, 8);
            let first = out.get_pixel(0, 0).0[0];
            assert!(out.pixels().all(|p| p.0[0] == first), "side {side}");
            assert_eq!(out.get_pixel(side - 1, side - 1).0[0], first);
        }
    }

    #[test]
    fn clahe_on_unaligned_gradient() {
        let gray = GrayImage::from_fn(49, 33, |x, _| Luma([60 + x as u8 * 2]));
        let out = clahe(&gray, 2.0, 8);
        assert_eq!(out.dimensions(), (49, 33));
        // darkest and brightest columns keep their order
        assert!(out.get_pixel(0, 16).0[0] < out.get_pixel(48, 16).0[0]);
    }

    #[test]
    fn clahe_handles_images_smaller_than_grid() {
        let gray = GrayImage::from_fn(3, 5, |x, y| Luma([(x * 40 + y * 10) as u8]));
        let out = clahe(&gray, 2.0, 8);
        assert_eq!(out.dimensions(), (3, 5));
    }

    #[test]
    fn neighbours_at_edges() {
        assert_eq!(neighbours(0, 8, 4), (0, 0, 0.0));
        assert_eq!(neighbours(31, 8, 4), (3, 3, 0.0));
        let (a, b, w) = neighbours(8, 8, 4);
        assert_eq!((a, b), (0, 1));
        assert!((w - 0.5625).abs() < 1e-6);
    }
}
