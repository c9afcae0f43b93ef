//! Result encoding for sitediff.
//!
//! Every visual output (heatmap, overlay, class map) is written as a
//! lossless RGB8 PNG.
//!
//! # Examples
//!
//! ```ignore
//! use sitediff_core::encode::{encode_png, write_png};
//!
//! let png = encode_png(&heatmap.pixels, heatmap.width, heatmap.height)?;
//! write_png(&heatmap, "/data/site/diff/heatmap.png")?;
//! ```

mod png;

pub use png::{encode_png, write_encoded, write_png, EncodeError};
