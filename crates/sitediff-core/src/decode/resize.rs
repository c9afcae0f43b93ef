//! Resampling and dimension alignment.
//!
//! Alignment is one-directional: the second capture is resampled to the
//! first capture's size and the first capture is never touched. There is no
//! georeferencing here, only dimension matching.

use tracing::{debug, warn};

use super::{FilterType, PixelBuffer, ShapeError};

/// Resize an image to exact dimensions.
///
/// Returns a new buffer; the input is left unchanged.
///
/// # Errors
///
/// Returns `ShapeError::ZeroSized` if the target or the source has a zero
/// dimension, or `ShapeError::BufferLength` if the source is malformed.
pub fn resize(
    image: &PixelBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, ShapeError> {
    if width == 0 || height == 0 {
        return Err(ShapeError::ZeroSized { width, height });
    }
    image.validate()?;

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image.to_rgb_image().ok_or(ShapeError::BufferLength {
        expected: image.pixel_count() * 3,
        actual: image.pixels.len(),
    })?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    PixelBuffer::from_rgb_image(resized)
}

/// Resample `other` with bilinear interpolation so it has exactly the
/// dimensions of `reference`.
///
/// # Errors
///
/// Returns a `ShapeError` if either buffer is zero-sized or malformed.
pub fn align_to(reference: &PixelBuffer, other: &PixelBuffer) -> Result<PixelBuffer, ShapeError> {
    reference.validate()?;
    other.validate()?;

    if reference.dimensions() == other.dimensions() {
        debug!(width = other.width, height = other.height, "dimensions already aligned");
        return Ok(other.clone());
    }

    warn!(
        from_width = other.width,
        from_height = other.height,
        to_width = reference.width,
        to_height = reference.height,
        "resampling second capture to match first"
    );
    resize(other, reference.width, reference.height, FilterType::Bilinear)
}
