//! Lossless PNG output for heatmaps, overlays and class maps.
//!
//! The encoder is a thin sink: it never creates directories, so the caller
//! must make sure the output directory exists.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;
use tracing::debug;

use crate::decode::PixelBuffer;

/// Errors that can occur during PNG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The parent directory of the output path does not exist
    #[error("Output directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),

    /// The filesystem rejected the write
    #[error("Failed to write {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Encode RGB pixel data to PNG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode a buffer to PNG and write it to `out_path`.
///
/// # Errors
///
/// Returns `EncodeError::MissingDirectory` if the parent directory of
/// `out_path` does not exist, `EncodeError::Io` if the write fails, and the
/// errors of [`encode_png`] for a malformed buffer.
pub fn write_png(buffer: &PixelBuffer, out_path: impl AsRef<Path>) -> Result<(), EncodeError> {
    let bytes = encode_png(&buffer.pixels, buffer.width, buffer.height)?;
    write_encoded(&bytes, out_path)
}

/// Write already-encoded PNG bytes to `out_path`.
///
/// # Errors
///
/// Returns `EncodeError::MissingDirectory` if the parent directory of
/// `out_path` does not exist and `EncodeError::Io` if the write fails.
pub fn write_encoded(bytes: &[u8], out_path: impl AsRef<Path>) -> Result<(), EncodeError> {
    let out_path = out_path.as_ref();

    // An empty parent means a bare file name relative to the working directory
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(EncodeError::MissingDirectory(parent.to_path_buf()));
        }
    }

    std::fs::write(out_path, bytes).map_err(|e| EncodeError::Io {
        path: out_path.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!(path = %out_path.display(), bytes = bytes.len(), "wrote png");
    Ok(())
}
