//! Raster loading with EXIF orientation handling.
//!
//! Any format the `image` crate was built with (PNG, JPEG, TIFF) is accepted.
//! Multi-page TIFFs yield their first page only.

use std::io::{self, Cursor};
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::debug;

use super::{DecodeError, Orientation, PixelBuffer};

/// Load a raster file into a canonical RGB8 buffer.
///
/// # Errors
///
/// Returns `DecodeError::NotFound` if `path` does not exist, and the errors of
/// [`load_from_bytes`] if its content cannot be decoded.
pub fn load(path: impl AsRef<Path>) -> Result<PixelBuffer, DecodeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DecodeError::NotFound(path.to_path_buf()),
        _ => DecodeError::IoError(format!("{}: {}", path.display(), e)),
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read raster file");
    load_from_bytes(&bytes)
}

/// Decode raster bytes into a canonical RGB8 buffer.
///
/// Alpha is dropped, gray is triplicated and 16-bit samples are scaled down
/// to 8 bits. EXIF orientation is applied so the buffer is upright.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized,
/// `DecodeError::CorruptedFile` if decoding fails, and
/// `DecodeError::EmptyImage` if the image has no pixels.
pub fn load_from_bytes(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    let format = reader.format().ok_or(DecodeError::InvalidFormat)?;

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    debug!(
        ?format,
        color = ?img.color(),
        width = img.width(),
        height = img.height(),
        ?orientation,
        "decoded raster"
    );

    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }

    let rgb = apply_orientation(img, orientation).into_rgb8();
    PixelBuffer::from_rgb_image(rgb).map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// Read the EXIF orientation tag, falling back to `Orientation::Normal` when
/// there is no EXIF block or the tag is missing.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
