//! WASM-compatible wrapper types and error conversion.
//!
//! Core results are kept in WASM memory and copied out on access. Core
//! errors cross the boundary as strings prefixed with their [`ErrorKind`],
//! e.g. `"NotFound: ..."` or `"InvalidInput: ..."`.

use serde::Serialize;
use sitediff_core::decode::{self, PixelBuffer};
use sitediff_core::{ErrorKind, PipelineError};
use wasm_bindgen::prelude::*;

/// A decoded capture, upright and in RGB8.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsImage {
    pub(crate) fn from_buffer(buffer: PixelBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            pixels: buffer.pixels,
        }
    }
}

/// Decode a capture (PNG, JPEG or TIFF) with EXIF orientation applied.
///
/// Useful to preview what the analysis functions will see.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsImage, JsValue> {
    decode::load_from_bytes(bytes)
        .map(JsImage::from_buffer)
        .map_err(|e| to_js_error(&PipelineError::from(e)))
}

/// `"<Kind>: <message>"` for a pipeline error.
pub(crate) fn error_message(err: &PipelineError) -> String {
    format!("{}: {}", kind_name(err.kind()), err)
}

pub(crate) fn to_js_error(err: &PipelineError) -> JsValue {
    JsValue::from_str(&error_message(err))
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "NotFound",
        ErrorKind::Decode => "Decode",
        ErrorKind::Shape => "Shape",
        ErrorKind::InvalidInput => "InvalidInput",
        ErrorKind::Encode => "Encode",
    }
}

/// Serialize to a plain JS value. Maps become ordinary objects so labels
/// read as properties.
pub(crate) fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitediff_core::{ClassifyError, DecodeError, ShapeError};

    #[test]
    fn test_js_image_from_buffer() {
        let buffer = PixelBuffer::filled(20, 10, [1, 2, 3]).unwrap();
        let img = JsImage::from_buffer(buffer);
        assert_eq!(img.width(), 20);
        assert_eq!(img.height(), 10);
        assert_eq!(img.byte_length(), 600);
        assert_eq!(&img.pixels()[0..3], &[1, 2, 3]);
    }

    #[test]
    fn test_error_message_prefix() {
        let err = PipelineError::from(DecodeError::InvalidFormat);
        assert!(error_message(&err).starts_with("Decode: "));

        let err = PipelineError::from(ShapeError::ZeroSized {
            width: 0,
            height: 3,
        });
        assert!(error_message(&err).starts_with("Shape: "));

        let err = PipelineError::from(ClassifyError::ReservedLabel("Unknown".to_string()));
        assert_eq!(
            error_message(&err),
            "InvalidInput: Label 'Unknown' is reserved for unmatched pixels"
        );
    }
}
