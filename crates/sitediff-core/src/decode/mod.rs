//! Image loading for sitediff.
//!
//! This module provides functionality for:
//! - Decoding PNG, JPEG and TIFF captures (first page of multi-page TIFFs)
//! - Normalizing every source to a canonical RGB8 [`PixelBuffer`]
//! - Applying EXIF orientation so drone captures come out upright
//! - Aligning a second capture to the dimensions of the first
//!
//! # Examples
//!
//! ```ignore
//! use sitediff_core::decode::{align_to, load};
//!
//! let before = load("/data/site/2024-03-01.tif")?;
//! let after = align_to(&before, &load("/data/site/2024-04-01.jpg")?)?;
//! assert_eq!(before.dimensions(), after.dimensions());
//! ```

mod load;
mod resize;
mod types;

pub use load::{load, load_from_bytes};
pub use resize::{align_to, resize};
pub use types::{DecodeError, FilterType, GrayBuffer, Orientation, PixelBuffer, ShapeError};
