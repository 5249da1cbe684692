//! Error types for the scanner

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scanner operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Everything that can go wrong between reading a frame and writing a report
#[derive(Error, Debug)]
pub enum ScanError {
    /// Image file could not be opened or decoded
    #[error("Could not load image from {}", .path.display())]
    ImageLoad {
        /// File that failed
        path: PathBuf,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// In-memory image bytes (stdin, uploads) could not be decoded
    #[error("Could not decode image from {label}")]
    ImageDecode {
        /// Where the bytes came from
        label: String,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// Raw frame buffer does not match its declared dimensions
    #[error("Frame buffer has {actual} bytes, expected {expected} for {width}x{height}")]
    FrameSize {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
        /// Bytes the dimensions require
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Annotated or generated image could not be written
    #[error("Could not save image to {}", .path.display())]
    ImageSave {
        /// Target file
        path: PathBuf,
        /// Encoder error
        #[source]
        source: image::ImageError,
    },

    /// Filesystem or stream failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report or configuration (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// QR payload could not be encoded when generating test images
    #[error("Failed to encode QR payload: {0}")]
    Encode(#[from] qrcode::types::QrError),
}

impl ScanError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ScanError::Config(message.into())
    }
}
