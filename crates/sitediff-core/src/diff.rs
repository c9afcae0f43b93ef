//! Change map between two aligned captures.
//!
//! The engine runs in two passes separated by a global reduction:
//!
//! 1. per pixel, the absolute per-channel difference is collapsed to a luma
//!    magnitude (the raw intensity), then the raw buffer is reduced to its
//!    severity histogram and min/max;
//! 2. per pixel, the raw intensity is stretched to 0..=255, colorized with
//!    the jet [`ColorMap`] and optionally blended over the first capture.
//!
//! Identical captures are not an error: the normalized map is all zero.

use serde::{Deserialize, Serialize};

use crate::colormap::ColorMap;
use crate::decode::{GrayBuffer, PixelBuffer, ShapeError};
use crate::histogram::{SeverityHistogram, SeverityThresholds};
use crate::luminance::delta_luma;
use crate::parallel;

/// Blend weight used by the product for translucent overlays.
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.4;

/// Options for [`diff`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffOptions {
    /// Heatmap weight in the overlay (0.0 to 1.0). 0.0 disables the overlay.
    pub blend_alpha: f32,
    /// Severity bin boundaries on the raw intensity.
    pub thresholds: SeverityThresholds,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            blend_alpha: 0.0,
            thresholds: SeverityThresholds::default(),
        }
    }
}

impl DiffOptions {
    /// Heatmap only, default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Heatmap plus an overlay at [`DEFAULT_OVERLAY_ALPHA`].
    pub fn overlay() -> Self {
        Self::new().with_blend_alpha(DEFAULT_OVERLAY_ALPHA)
    }

    pub fn with_blend_alpha(mut self, alpha: f32) -> Self {
        self.blend_alpha = alpha;
        self
    }

    pub fn with_thresholds(mut self, thresholds: SeverityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Effective blend weight; NaN is treated as 0.
    pub fn effective_alpha(&self) -> f32 {
        if self.blend_alpha.is_nan() {
            0.0
        } else {
            self.blend_alpha.clamp(0.0, 1.0)
        }
    }
}

/// Output of [`diff`].
#[derive(Debug, Clone)]
pub struct DiffResult {
    /// Luma of the absolute difference, before normalization.
    pub raw_intensity: GrayBuffer,
    /// Raw intensity stretched so the observed min maps to 0 and max to 255.
    pub intensity: GrayBuffer,
    /// `intensity` colorized with the jet map.
    pub heatmap: PixelBuffer,
    /// Heatmap blended over the first capture, when enabled.
    pub overlay: Option<PixelBuffer>,
    pub severity: SeverityHistogram,
    /// Smallest raw intensity.
    pub min: u8,
    /// Largest raw intensity.
    pub max: u8,
}

impl DiffResult {
    /// True when every pixel has the same raw intensity, in which case the
    /// normalized map is all zero.
    pub fn is_flat(&self) -> bool {
        self.min == self.max
    }
}

/// Partial result of the pass-1 reduction.
#[derive(Debug, Clone, Copy)]
struct IntensitySummary {
    histogram: SeverityHistogram,
    min: u8,
    max: u8,
}

impl IntensitySummary {
    fn empty() -> Self {
        Self {
            histogram: SeverityHistogram::new(),
            min: u8::MAX,
            max: u8::MIN,
        }
    }

    fn of_row(row: &[u8], thresholds: &SeverityThresholds) -> Self {
        let (min, max) = row
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Self {
            histogram: SeverityHistogram::from_intensities(row, thresholds),
            min,
            max,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            histogram: self.histogram.merge(other.histogram),
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Compute the change map between `a` and `b`.
///
/// `b` must already be aligned to `a` (see [`crate::decode::align_to`]); the
/// overlay, when enabled, is drawn over `a`.
///
/// # Errors
///
/// Returns a `ShapeError` if either buffer is zero-sized or malformed, or if
/// their dimensions differ.
pub fn diff(
    a: &PixelBuffer,
    b: &PixelBuffer,
    options: &DiffOptions,
) -> Result<DiffResult, ShapeError> {
    a.validate()?;
    b.validate()?;
    if a.dimensions() != b.dimensions() {
        return Err(ShapeError::Mismatch {
            expected_width: a.width,
            expected_height: a.height,
            actual_width: b.width,
            actual_height: b.height,
        });
    }

    let width = a.width as usize;

    // Pass 1: raw intensity, then histogram and min/max
    let mut raw = vec![0u8; a.pixel_count()];
    parallel::zip_rows(&mut raw, width, &a.pixels, &b.pixels, a.stride(), |out, ra, rb| {
        for ((dst, pa), pb) in out.iter_mut().zip(ra.chunks_exact(3)).zip(rb.chunks_exact(3)) {
            *dst = delta_luma(pa, pb);
        }
    });

    let thresholds = options.thresholds;
    let summary = parallel::reduce_rows(
        &raw,
        width,
        IntensitySummary::empty,
        |row| IntensitySummary::of_row(row, &thresholds),
        IntensitySummary::merge,
    );

    // Pass 2: normalize, colorize, blend
    let lut = normalization_lut(summary.min, summary.max);
    let mut normalized = vec![0u8; raw.len()];
    parallel::map_rows(&mut normalized, width, &raw, width, |out, row| {
        for (dst, &v) in out.iter_mut().zip(row) {
            *dst = lut[v as usize];
        }
    });

    let raw_intensity = GrayBuffer::new(a.width, a.height, raw)?;
    let intensity = GrayBuffer::new(a.width, a.height, normalized)?;
    let heatmap = ColorMap::jet().apply(&intensity);

    let alpha = options.effective_alpha();
    let overlay = if alpha > 0.0 {
        Some(blend(a, &heatmap, alpha)?)
    } else {
        None
    };

    Ok(DiffResult {
        raw_intensity,
        intensity,
        heatmap,
        overlay,
        severity: summary.histogram,
        min: summary.min,
        max: summary.max,
    })
}

/// Lookup table for the min/max stretch. A flat input maps everything to 0.
fn normalization_lut(min: u8, max: u8) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if max <= min {
        return lut;
    }
    let range = (max - min) as f32;
    for (v, entry) in lut.iter_mut().enumerate().skip(min as usize) {
        let stretched = (v - min as usize) as f32 * 255.0 / range;
        *entry = stretched.clamp(0.0, 255.0).round() as u8;
    }
    lut
}

/// `base * (1 - alpha) + overlay * alpha`, per channel.
///
/// # Errors
///
/// Returns a `ShapeError` if the buffers are malformed or differ in size.
pub fn blend(
    base: &PixelBuffer,
    overlay: &PixelBuffer,
    alpha: f32,
) -> Result<PixelBuffer, ShapeError> {
    base.validate()?;
    overlay.validate()?;
    if base.dimensions() != overlay.dimensions() {
        return Err(ShapeError::Mismatch {
            expected_width: base.width,
            expected_height: base.height,
            actual_width: overlay.width,
            actual_height: overlay.height,
        });
    }

    let alpha = alpha.clamp(0.0, 1.0);
    let stride = base.stride();
    let mut pixels = vec![0u8; base.pixels.len()];
    parallel::zip_rows(&mut pixels, stride, &base.pixels, &overlay.pixels, stride, |out, rb, ro| {
        for ((dst, &b), &o) in out.iter_mut().zip(rb).zip(ro) {
            let v = b as f32 * (1.0 - alpha) + o as f32 * alpha;
            *dst = v.clamp(0.0, 255.0).round() as u8;
        }
    });

    PixelBuffer::new(base.width, base.height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::{JET_COLD, JET_HOT};

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / width.max(1)) as u8);
                pixels.push((y * 255 / height.max(1)) as u8);
                pixels.push(((x + y) * 7 % 256) as u8);
            }
        }
        PixelBuffer::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_black_2x2_against_itself() {
        let black = PixelBuffer::filled(2, 2, [0, 0, 0]).unwrap();
        let result = diff(&black, &black, &DiffOptions::default()).unwrap();

        assert_eq!(
            result.severity,
            SeverityHistogram {
                low: 4,
                medium: 0,
                high: 0,
                total: 4
            }
        );
        assert!(result.intensity.is_zero());
        assert!(result.raw_intensity.is_zero());
        assert!(result.is_flat());
        assert!(result.overlay.is_none());
    }

    #[test]
    fn test_identical_images_are_cold() {
        let img = gradient(17, 9);
        let result = diff(&img, &img, &DiffOptions::overlay()).unwrap();

        assert_eq!(result.severity.low, result.severity.total);
        assert!(result.intensity.is_zero());
        assert!(result
            .heatmap
            .pixels
            .chunks_exact(3)
            .all(|px| px == JET_COLD));
    }

    #[test]
    fn test_normalization_stretches_to_full_range() {
        // One unchanged pixel, one fully changed pixel
        let a = PixelBuffer::new(2, 1, vec![0, 0, 0, 0, 0, 0]).unwrap();
        let b = PixelBuffer::new(2, 1, vec![0, 0, 0, 255, 255, 255]).unwrap();
        let result = diff(&a, &b, &DiffOptions::default()).unwrap();

        assert_eq!(result.raw_intensity.pixels, vec![0, 255]);
        assert_eq!(result.intensity.pixels, vec![0, 255]);
        assert_eq!(result.heatmap.get(0, 0), Some(JET_COLD));
        assert_eq!(result.heatmap.get(1, 0), Some(JET_HOT));
        assert_eq!(result.severity.low, 1);
        assert_eq!(result.severity.high, 1);
    }

    #[test]
    fn test_severity_uses_raw_intensity() {
        // Raw intensities 10 and 20: normalization would stretch 20 to 255,
        // but both must stay in the low bin.
        let a = PixelBuffer::new(2, 1, vec![0; 6]).unwrap();
        let b = PixelBuffer::new(2, 1, vec![10, 10, 10, 20, 20, 20]).unwrap();
        let result = diff(&a, &b, &DiffOptions::default()).unwrap();

        assert_eq!(result.min, 10);
        assert_eq!(result.max, 20);
        assert_eq!(result.intensity.pixels, vec![0, 255]);
        assert_eq!(result.severity.low, 2);
        assert_eq!(result.severity.high, 0);
    }

    #[test]
    fn test_raw_intensity_uses_luma_of_delta() {
        let a = PixelBuffer::new(1, 1, vec![100, 100, 100]).unwrap();
        let b = PixelBuffer::new(1, 1, vec![200, 100, 100]).unwrap();
        let result = diff(&a, &b, &DiffOptions::default()).unwrap();

        // 0.299 * 100 = 29.9
        assert_eq!(result.raw_intensity.pixels, vec![30]);
        assert_eq!(result.severity.low, 1);
    }

    #[test]
    fn test_medium_bin() {
        let a = PixelBuffer::new(1, 1, vec![0, 0, 0]).unwrap();
        let b = PixelBuffer::new(1, 1, vec![100, 100, 100]).unwrap();
        let result = diff(&a, &b, &DiffOptions::default()).unwrap();

        assert_eq!(result.severity.medium, 1);
        // A single pixel is flat: normalized to 0
        assert!(result.intensity.is_zero());
    }

    #[test]
    fn test_overlay_blend() {
        let a = PixelBuffer::new(2, 1, vec![100, 100, 100, 100, 100, 100]).unwrap();
        let b = PixelBuffer::new(2, 1, vec![100, 100, 100, 0, 0, 0]).unwrap();
        let options = DiffOptions::new().with_blend_alpha(0.5);
        let result = diff(&a, &b, &options).unwrap();

        let overlay = result.overlay.unwrap();
        assert_eq!(overlay.dimensions(), (2, 1));
        // Cold pixel: (100,100,100) * 0.5 + (0,0,128) * 0.5
        assert_eq!(overlay.get(0, 0), Some([50, 50, 114]));
        // Hot pixel: (100,100,100) * 0.5 + (128,0,0) * 0.5
        assert_eq!(overlay.get(1, 0), Some([114, 50, 50]));
    }

    #[test]
    fn test_full_alpha_overlay_equals_heatmap() {
        let a = gradient(8, 8);
        let b = PixelBuffer::filled(8, 8, [255, 255, 255]).unwrap();
        let result = diff(&a, &b, &DiffOptions::new().with_blend_alpha(1.0)).unwrap();

        assert_eq!(result.overlay.as_ref(), Some(&result.heatmap));
    }

    #[test]
    fn test_alpha_is_clamped() {
        assert_eq!(DiffOptions::new().with_blend_alpha(-1.0).effective_alpha(), 0.0);
        assert_eq!(DiffOptions::new().with_blend_alpha(3.0).effective_alpha(), 1.0);
        assert_eq!(DiffOptions::new().with_blend_alpha(f32::NAN).effective_alpha(), 0.0);
        assert_eq!(DiffOptions::overlay().effective_alpha(), DEFAULT_OVERLAY_ALPHA);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = gradient(4, 4);
        let b = gradient(4, 5);
        assert!(matches!(
            diff(&a, &b, &DiffOptions::default()),
            Err(ShapeError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_zero_sized_input() {
        let empty = PixelBuffer {
            width: 0,
            height: 3,
            pixels: vec![],
        };
        assert!(matches!(
            diff(&empty, &empty, &DiffOptions::default()),
            Err(ShapeError::ZeroSized { .. })
        ));
    }

    #[test]
    fn test_inputs_are_not_modified() {
        let a = gradient(6, 6);
        let b = PixelBuffer::filled(6, 6, [3, 200, 40]).unwrap();
        let (a0, b0) = (a.clone(), b.clone());
        let _ = diff(&a, &b, &DiffOptions::overlay()).unwrap();
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_row_summaries_merge_to_whole_buffer() {
        let thresholds = SeverityThresholds::default();
        let raw: Vec<u8> = vec![0, 30, 31, 120, 121, 255, 7, 90];

        let merged = raw
            .chunks(3)
            .map(|row| IntensitySummary::of_row(row, &thresholds))
            .fold(IntensitySummary::empty(), IntensitySummary::merge);

        assert_eq!(
            merged.histogram,
            SeverityHistogram::from_intensities(&raw, &thresholds)
        );
        assert_eq!((merged.min, merged.max), (0, 255));
        assert_eq!(
            (merged.histogram.low, merged.histogram.medium, merged.histogram.high),
            (3, 3, 2)
        );
    }

    #[test]
    fn test_normalization_lut() {
        let lut = normalization_lut(10, 20);
        assert_eq!(lut[10], 0);
        assert_eq!(lut[15], 128);
        assert_eq!(lut[20], 255);

        assert!(normalization_lut(42, 42).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_options_deserialize() {
        let options: DiffOptions =
            serde_json::from_str(r#"{"blendAlpha": 0.4, "thresholds": {"mediumMax": 100}}"#)
                .unwrap();
        assert_eq!(options.blend_alpha, 0.4);
        assert_eq!(options.thresholds.low_max, 30);
        assert_eq!(options.thresholds.medium_max, 100);

        let defaults: DiffOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, DiffOptions::default());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
