//! Sitediff WASM - WebAssembly bindings for sitediff
//!
//! This crate exposes the sitediff-core analyses to a browser caller that
//! holds captures as byte buffers instead of file paths.
//!
//! # Module Structure
//!
//! - `types` - decoded image wrapper and error conversion
//! - `diff` - change heatmap between two captures
//! - `classify` - color-range material classification
//!
//! # Usage
//!
//! ```typescript
//! import init, { compute_difference, classify_image } from '@sitediff/wasm';
//!
//! await init();
//!
//! const diff = compute_difference(before, after, 0.0);
//! const classes = classify_image(after, undefined); // default rules
//! console.log(classes.counts());
//! ```

use wasm_bindgen::prelude::*;

mod classify;
mod diff;
mod types;

pub use classify::{classify_image, default_rules, JsClassification};
pub use diff::{compute_difference, JsDiffResult};
pub use types::{decode_image, JsImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
