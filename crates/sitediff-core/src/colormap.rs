//! Jet color map for change heatmaps.
//!
//! Low intensities map to dark blue, passing through cyan, green and yellow,
//! to dark red at full intensity.

use crate::decode::{GrayBuffer, PixelBuffer};
use crate::parallel;

/// Color of intensity 0.
pub const JET_COLD: [u8; 3] = [0, 0, 128];

/// Color of intensity 255.
pub const JET_HOT: [u8; 3] = [128, 0, 0];

/// Pre-computed 256-entry lookup table from intensity to RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    /// LUT values: lut[intensity] = [r, g, b]
    pub lut: [[u8; 3]; 256],
}

impl ColorMap {
    /// Build the jet gradient.
    ///
    /// Each channel is a clamped triangle `1.5 - |4x - c|` centered at
    /// `c = 3` (red), `c = 2` (green) and `c = 1` (blue), with `x = i / 255`.
    pub fn jet() -> Self {
        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let x = i as f32 / 255.0;
            *entry = [jet_channel(x, 3.0), jet_channel(x, 2.0), jet_channel(x, 1.0)];
        }
        Self { lut }
    }

    #[inline]
    pub fn lookup(&self, intensity: u8) -> [u8; 3] {
        self.lut[intensity as usize]
    }

    /// Colorize an intensity buffer.
    pub fn apply(&self, intensity: &GrayBuffer) -> PixelBuffer {
        let width = intensity.width as usize;
        let mut pixels = vec![0u8; intensity.pixels.len() * 3];

        parallel::map_rows(&mut pixels, width * 3, &intensity.pixels, width, |out, row| {
            for (dst, &v) in out.chunks_exact_mut(3).zip(row) {
                dst.copy_from_slice(&self.lut[v as usize]);
            }
        });

        PixelBuffer {
            width: intensity.width,
            height: intensity.height,
            pixels,
        }
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::jet()
    }
}

#[inline]
fn jet_channel(x: f32, center: f32) -> u8 {
    let v = (1.5 - (4.0 * x - center).abs()).clamp(0.0, 1.0);
    (v * 255.0).round() as u8
}
