//! Synthetic test frames: single codes and the four-module layout used to
//! exercise the scanner end to end.

use crate::error::{Result, ScanError};
use image::{GrayImage, Luma};
use log::warn;
use qrcode::{Color, EcLevel, QrCode};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Render `data` as a black-on-white code, ECC level L, smallest version that fits.
///
/// Every module becomes a `box_size` square; `border` light modules surround
/// the symbol.
pub fn render_code(data: &str, box_size: u32, border: u32) -> Result<GrayImage> {
    if box_size == 0 {
        return Err(ScanError::config("box_size must be at least 1"));
    }
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * border) * box_size;

    Ok(GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / box_size) as i64 - border as i64;
        let my = (y / box_size) as i64 - border as i64;
        let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
        if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
            DARK
        } else {
            LIGHT
        }
    }))
}

/// Canvas and code placement of a multi-module test frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    /// Canvas width
    pub width: u32,
    /// Canvas height
    pub height: u32,
    /// Pixels per module
    pub box_size: u32,
    /// Quiet zone in modules
    pub border: u32,
    /// Top-left corner of each code
    pub positions: Vec<(u32, u32)>,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            box_size: 3,
            border: 2,
            positions: vec![(100, 100), (400, 100), (100, 350), (400, 350)],
        }
    }
}

/// Payloads of the four reference modules: two bare ids, two JSON objects
pub fn default_payloads() -> Vec<String> {
    vec![
        "MODULE_001".to_string(),
        r#"{"device_id": "SENSOR_001", "type": "temperature_sensor", "model": "TempSens3000", "firmware": "1.2.3"}"#
            .to_string(),
        "ACTUATOR_001".to_string(),
        r#"{"device_id": "DISPLAY_001", "type": "lcd_display", "resolution": "128x64"}"#
            .to_string(),
    ]
}

/// Paste one rendered code per payload onto a white canvas
pub fn test_frame<S: AsRef<str>>(payloads: &[S], layout: &FrameLayout) -> Result<GrayImage> {
    if payloads.len() > layout.positions.len() {
        return Err(ScanError::config(format!(
            "{} payloads but only {} positions",
            payloads.len(),
            layout.positions.len()
        )));
    }

    let mut canvas = GrayImage::from_pixel(layout.width, layout.height, LIGHT);
    for (payload, &(x, y)) in payloads.iter().zip(&layout.positions) {
        let code = render_code(payload.as_ref(), layout.box_size, layout.border)?;
        if x + code.width() > layout.width || y + code.height() > layout.height {
            warn!(
                "code at ({x}, {y}) is {}px and will be clipped by the {}x{} canvas",
                code.width(),
                layout.width,
                layout.height
            );
        }
        image::imageops::replace(&mut canvas, &code, x as i64, y as i64);
    }
    Ok(canvas)
}
