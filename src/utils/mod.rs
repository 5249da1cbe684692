//! Utility functions for image processing
//!
//! - Grayscale conversion of raw camera frames (RGB/RGBA to luminance)
//! - Adaptive binarization (mean and gaussian local thresholds)
//! - Geometry (mapping detector corners back to the original frame)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
