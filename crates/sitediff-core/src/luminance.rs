//! Luma weighting used to collapse a per-channel difference to one magnitude.
//!
//! Uses the ITU-R BT.601 coefficients, the same weighting as a standard
//! RGB-to-gray conversion.

/// ITU-R BT.601 coefficient for the red channel.
pub const LUMA_R: f32 = 0.299;

/// ITU-R BT.601 coefficient for the green channel.
pub const LUMA_G: f32 = 0.587;

/// ITU-R BT.601 coefficient for the blue channel.
pub const LUMA_B: f32 = 0.114;

/// Calculate luma from u8 RGB values (0 to 255), rounded to the nearest integer.
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let lum = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    lum.clamp(0.0, 255.0).round() as u8
}

/// Luma of the absolute per-channel difference between two RGB pixels.
#[inline]
pub fn delta_luma(a: &[u8], b: &[u8]) -> u8 {
    luma_u8(a[0].abs_diff(b[0]), a[1].abs_diff(b[1]), a[2].abs_diff(b[2]))
}
