//! Severity histogram over raw change intensities.
//!
//! Bucketing happens before normalization, so the thresholds mean the same
//! thing for every pair of captures.

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the low bin.
pub const DEFAULT_LOW_MAX: u8 = 30;

/// Upper bound (inclusive) of the medium bin.
pub const DEFAULT_MEDIUM_MAX: u8 = 120;

/// One of the three change-magnitude categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Bin boundaries: `low` if `v <= low_max`, `medium` if `v <= medium_max`,
/// `high` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeverityThresholds {
    pub low_max: u8,
    pub medium_max: u8,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            low_max: DEFAULT_LOW_MAX,
            medium_max: DEFAULT_MEDIUM_MAX,
        }
    }
}

impl SeverityThresholds {
    #[inline]
    pub fn classify(&self, intensity: u8) -> Severity {
        if intensity <= self.low_max {
            Severity::Low
        } else if intensity <= self.medium_max {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

/// Pixel counts per severity bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityHistogram {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub total: u64,
}

impl SeverityHistogram {
    /// Create a new empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket every value of a raw intensity buffer.
    pub fn from_intensities(values: &[u8], thresholds: &SeverityThresholds) -> Self {
        let mut hist = Self::new();
        for &v in values {
            hist.record(thresholds.classify(v));
        }
        hist
    }

    #[inline]
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
        }
        self.total += 1;
    }

    /// Combine two partial histograms (order independent).
    pub fn merge(self, other: Self) -> Self {
        Self {
            low: self.low + other.low,
            medium: self.medium + other.medium,
            high: self.high + other.high,
            total: self.total + other.total,
        }
    }

    pub fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
        }
    }

    /// Share of pixels in a bin (0.0 to 1.0); 0.0 for an empty histogram.
    pub fn fraction(&self, severity: Severity) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(severity) as f64 / self.total as f64
    }

    /// `low + medium + high == total`
    pub fn is_consistent(&self) -> bool {
        self.low + self.medium + self.high == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        let t = SeverityThresholds::default();
        assert_eq!(t.classify(0), Severity::Low);
        assert_eq!(t.classify(30), Severity::Low);
        assert_eq!(t.classify(31), Severity::Medium);
        assert_eq!(t.classify(120), Severity::Medium);
        assert_eq!(t.classify(121), Severity::High);
        assert_eq!(t.classify(255), Severity::High);
    }

    #[test]
    fn test_from_intensities() {
        let hist = SeverityHistogram::from_intensities(
            &[0, 30, 31, 120, 121, 255],
            &SeverityThresholds::default(),
        );
        assert_eq!(
            hist,
            SeverityHistogram {
                low: 2,
                medium: 2,
                high: 2,
                total: 6
            }
        );
        assert!(hist.is_consistent());
    }

    #[test]
    fn test_empty_histogram() {
        let hist = SeverityHistogram::from_intensities(&[], &SeverityThresholds::default());
        assert_eq!(hist.total, 0);
        assert_eq!(hist.fraction(Severity::Low), 0.0);
        assert!(hist.is_consistent());
    }

    #[test]
    fn test_merge_is_order_independent() {
        let t = SeverityThresholds::default();
        let a = SeverityHistogram::from_intensities(&[0, 50, 200], &t);
        let b = SeverityHistogram::from_intensities(&[121, 121, 5], &t);

        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(
            a.merge(b),
            SeverityHistogram::from_intensities(&[0, 50, 200, 121, 121, 5], &t)
        );
        assert_eq!(a.merge(SeverityHistogram::new()), a);
    }

    #[test]
    fn test_fraction() {
        let hist = SeverityHistogram {
            low: 1,
            medium: 1,
            high: 2,
            total: 4,
        };
        assert_eq!(hist.fraction(Severity::High), 0.5);
        assert_eq!(hist.fraction(Severity::Low), 0.25);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = SeverityThresholds {
            low_max: 0,
            medium_max: 0,
        };
        assert_eq!(t.classify(0), Severity::Low);
        assert_eq!(t.classify(1), Severity::High);

        // Inverted bounds leave the medium bin empty
        let inverted = SeverityThresholds {
            low_max: 10,
            medium_max: 5,
        };
        assert_eq!(inverted.classify(10), Severity::Low);
        assert_eq!(inverted.classify(11), Severity::High);
    }

    #[test]
    fn test_thresholds_deserialize_with_defaults() {
        let t: SeverityThresholds = serde_json::from_str(r#"{"lowMax": 10}"#).unwrap();
        assert_eq!(t.low_max, 10);
        assert_eq!(t.medium_max, DEFAULT_MEDIUM_MAX);
    }
}
