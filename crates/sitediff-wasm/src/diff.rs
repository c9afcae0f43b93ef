//! Change-map WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { compute_difference } from '@sitediff/wasm';
//!
//! const before = new Uint8Array(await a.arrayBuffer());
//! const after = new Uint8Array(await b.arrayBuffer());
//! const result = compute_difference(before, after, 0.4);
//! console.log(`high: ${result.high} / ${result.total}`);
//! const blob = new Blob([result.heatmap_png()], { type: 'image/png' });
//! ```

use sitediff_core::decode::{align_to, load_from_bytes};
use sitediff_core::encode::encode_png;
use sitediff_core::{diff, DiffOptions, PipelineError, SeverityHistogram};
use wasm_bindgen::prelude::*;

use crate::types::to_js_error;

/// Heatmap, optional overlay and severity counts for a pair of captures.
#[wasm_bindgen]
pub struct JsDiffResult {
    width: u32,
    height: u32,
    heatmap_png: Vec<u8>,
    overlay_png: Option<Vec<u8>>,
    severity: SeverityHistogram,
}

#[wasm_bindgen]
impl JsDiffResult {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG-encoded jet heatmap.
    pub fn heatmap_png(&self) -> Vec<u8> {
        self.heatmap_png.clone()
    }

    /// PNG-encoded overlay, or `undefined` when `blend_alpha` was 0.
    pub fn overlay_png(&self) -> Option<Vec<u8>> {
        self.overlay_png.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn low(&self) -> f64 {
        self.severity.low as f64
    }

    #[wasm_bindgen(getter)]
    pub fn medium(&self) -> f64 {
        self.severity.medium as f64
    }

    #[wasm_bindgen(getter)]
    pub fn high(&self) -> f64 {
        self.severity.high as f64
    }

    #[wasm_bindgen(getter)]
    pub fn total(&self) -> f64 {
        self.severity.total as f64
    }
}

/// Diff two encoded captures.
///
/// The second capture is resampled to the first one's size. `blend_alpha`
/// (0.0 to 1.0) controls the overlay; 0.0 returns the heatmap only.
///
/// # Errors
///
/// Returns a string prefixed with the error kind (`Decode`, `Shape`,
/// `Encode`) if either capture cannot be used.
#[wasm_bindgen]
pub fn compute_difference(
    a_bytes: &[u8],
    b_bytes: &[u8],
    blend_alpha: f32,
) -> Result<JsDiffResult, JsValue> {
    diff_bytes(a_bytes, b_bytes, &DiffOptions::new().with_blend_alpha(blend_alpha))
        .map_err(|e| to_js_error(&e))
}

pub(crate) fn diff_bytes(
    a_bytes: &[u8],
    b_bytes: &[u8],
    options: &DiffOptions,
) -> Result<JsDiffResult, PipelineError> {
    let first = load_from_bytes(a_bytes)?;
    let second = align_to(&first, &load_from_bytes(b_bytes)?)?;
    let result = diff(&first, &second, options)?;

    let heatmap_png = encode_png(&result.heatmap.pixels, first.width, first.height)?;
    let overlay_png = match &result.overlay {
        Some(overlay) => Some(encode_png(&overlay.pixels, overlay.width, overlay.height)?),
        None => None,
    };

    Ok(JsDiffResult {
        width: first.width,
        height: first.height,
        heatmap_png,
        overlay_png,
        severity: result.severity,
    })
}
