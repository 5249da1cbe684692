//! Grayscale morphology with a `k` x `k` square structuring element.
//!
//! The anchor sits at `k / 2`, so for even sizes the element extends one
//! pixel further up/left than down/right. Dilation uses the reflected
//! element, which keeps opening and closing idempotent. Out-of-image pixels
//! are ignored.

use image::GrayImage;

/// Minimum filter
pub fn erode(gray: &GrayImage, kernel: u32) -> GrayImage {
    let (before, after) = extents(kernel);
    rank_filter(gray, before, after, u8::min, u8::MAX)
}

/// Maximum filter
pub fn dilate(gray: &GrayImage, kernel: u32) -> GrayImage {
    let (before, after) = extents(kernel);
    rank_filter(gray, after, before, u8::max, u8::MIN)
}

/// Erode then dilate: removes bright specks smaller than the element
pub fn open(gray: &GrayImage, kernel: u32) -> GrayImage {
    dilate(&erode(gray, kernel), kernel)
}

/// Dilate then erode: fills dark gaps smaller than the element
pub fn close(gray: &GrayImage, kernel: u32) -> GrayImage {
    erode(&dilate(gray, kernel), kernel)
}

fn extents(kernel: u32) -> (u32, u32) {
    let k = kernel.max(1);
    let anchor = k / 2;
    (anchor, k - 1 - anchor)
}

/// Separable min/max over `[p - before, p + after]` on both axes
fn rank_filter(
    gray: &GrayImage,
    before: u32,
    after: u32,
    pick: fn(u8, u8) -> u8,
    identity: u8,
) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || before + after == 0 {
        return gray.clone();
    }

    let mut horizontal = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let x0 = x.saturating_sub(before);
            let x1 = (x + after).min(width - 1);
            let v = (x0..=x1).fold(identity, |acc, sx| pick(acc, gray.get_pixel(sx, y).0[0]));
            horizontal.get_pixel_mut(x, y).0[0] = v;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let y0 = y.saturating_sub(before);
        let y1 = (y + after).min(height - 1);
        for x in 0..width {
            let v = (y0..=y1).fold(identity, |acc, sy| {
                pick(acc, horizontal.get_pixel(x, sy).0[0])
            });
            out.get_pixel_mut(x, y).0[0] = v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn close_fills_single_pixel_gap() {
        let mut gray = GrayImage::from_pixel(6, 6, Luma([200]));
        gray.put_pixel(3, 3, Luma([10]));
        let closed = close(&gray, 2);
        assert!(closed.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn open_removes_single_pixel_speck() {
        let mut gray = GrayImage::from_pixel(6, 6, Luma([20]));
        gray.put_pixel(2, 2, Luma([250]));
        let opened = open(&gray, 2);
        assert!(opened.pixels().all(|p| p.0[0] == 20));
    }

    #[test]
    fn open_keeps_blocks_at_least_kernel_sized() {
        let mut gray = GrayImage::from_pixel(8, 8, Luma([0]));
        for y in 3..5 {
            for x in 3..5 {
                gray.put_pixel(x, y, Luma([255]));
            }
        }
        assert_eq!(open(&gray, 2), gray);
    }

    #[test]
    fn erode_anchor_for_even_kernel() {
        let mut gray = GrayImage::from_pixel(4, 1, Luma([100]));
        gray.put_pixel(1, 0, Luma([0]));
        let eroded = erode(&gray, 2);
        // window is [x-1, x]
        assert_eq!(eroded.get_pixel(0, 0).0[0], 100);
        assert_eq!(eroded.get_pixel(1, 0).0[0], 0);
        assert_eq!(eroded.get_pixel(2, 0).0[0], 0);
        assert_eq!(eroded.get_pixel(3, 0).0[0], 100);
    }

    #[test]
    fn kernel_of_one_is_identity() {
        let gray = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 50 + y) as u8]));
        assert_eq!(open(&gray, 1), gray);
        assert_eq!(close(&gray, 1), gray);
    }
}
