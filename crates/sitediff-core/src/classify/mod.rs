//! Rule-based material classification.
//!
//! Every pixel is tested against an ordered [`RuleSet`]; the first rule whose
//! three inclusive channel ranges contain the pixel gives its label, and
//! pixels matching nothing are labeled [`UNKNOWN_LABEL`].
//!
//! ## Algorithm
//!
//! Classification is a flat map from each RGB pixel to a class id with no
//! dependency between pixels. Rows are processed independently (on the rayon
//! pool with the `parallel` feature), then a second row pass paints the
//! display colors and a reduction counts each class.

mod rules;

use serde::ser::{Serialize, Serializer};
use thiserror::Error;

use crate::decode::{PixelBuffer, ShapeError};
use crate::parallel;

pub use rules::{
    ChannelRange, ClassificationRule, RuleSet, FALLBACK_PALETTE, UNKNOWN_COLOR, UNKNOWN_LABEL,
};

/// Errors that can occur during classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The image is zero-sized or malformed
    #[error("Invalid input image: {0}")]
    InvalidImage(#[from] ShapeError),

    #[error("Rule label must not be empty")]
    EmptyLabel,

    #[error("Label '{0}' is reserved for unmatched pixels")]
    ReservedLabel(String),

    #[error("Duplicate rule label '{0}'")]
    DuplicateLabel(String),

    #[error("Rule '{label}' has an empty {channel} range ({min} > {max})")]
    InvalidRange {
        label: String,
        channel: &'static str,
        min: u8,
        max: u8,
    },

    #[error("Too many rules: {0}")]
    TooManyRules(usize),

    #[error("Invalid rule set JSON: {0}")]
    InvalidJson(String),
}

/// Pixel count per label, in rule order followed by [`UNKNOWN_LABEL`].
///
/// Every rule label is present, including those with a zero count.
/// Serializes as a JSON object that keeps this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCounts {
    entries: Vec<(String, u64)>,
}

impl ClassCounts {
    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|&(_, count)| count)
    }

    /// Sum of all counts; equals the number of classified pixels.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(label, count)| (label.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Share of each label in percent, rounded to two decimal places.
    pub fn percentages(&self) -> ClassPercentages {
        let total = self.total();
        let entries = self
            .entries
            .iter()
            .map(|(label, count)| (label.clone(), percentage(*count, total)))
            .collect();
        ClassPercentages { entries }
    }
}

impl Serialize for ClassCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Percentage per label, same order as [`ClassCounts`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPercentages {
    entries: Vec<(String, f64)>,
}

impl ClassPercentages {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|&(_, pct)| pct)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(label, pct)| (label.as_str(), *pct))
    }
}

impl Serialize for ClassPercentages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// `count / total * 100`, rounded to two decimals. 0.0 when `total` is 0.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Class map painted with each label's display color.
    pub map: PixelBuffer,
    /// Class id per pixel, row-major: the rule index, or `labels.len() - 1`
    /// for unmatched pixels.
    pub class_ids: Vec<u16>,
    /// Rule labels in order, then [`UNKNOWN_LABEL`].
    pub labels: Vec<String>,
    pub counts: ClassCounts,
}

impl Classification {
    /// Label of the pixel at `(x, y)`.
    pub fn label_at(&self, x: u32, y: u32) -> Option<&str> {
        if x >= self.map.width || y >= self.map.height {
            return None;
        }
        let id = *self
            .class_ids
            .get(y as usize * self.map.width as usize + x as usize)?;
        self.labels.get(id as usize).map(String::as_str)
    }

    pub fn percentages(&self) -> ClassPercentages {
        self.counts.percentages()
    }
}

/// Classify every pixel of `buffer` with `rules`.
///
/// # Errors
///
/// Returns `ClassifyError::InvalidImage` if the buffer is zero-sized or
/// malformed, or a rule validation error if `rules` is invalid.
pub fn classify(buffer: &PixelBuffer, rules: &RuleSet) -> Result<Classification, ClassifyError> {
    buffer.validate()?;
    rules.validate()?;

    let width = buffer.width as usize;
    let unknown_id = rules.len() as u16;

    let mut class_ids = vec![0u16; buffer.pixel_count()];
    parallel::map_rows(&mut class_ids, width, &buffer.pixels, buffer.stride(), |out, row| {
        for (id, px) in out.iter_mut().zip(row.chunks_exact(3)) {
            let px = [px[0], px[1], px[2]];
            *id = rules.first_match(&px).map_or(unknown_id, |i| i as u16);
        }
    });

    let palette: Vec<[u8; 3]> = (0..rules.len())
        .map(|i| rules.color_of(i))
        .chain(std::iter::once(UNKNOWN_COLOR))
        .collect();

    let mut pixels = vec![0u8; buffer.pixels.len()];
    parallel::map_rows(&mut pixels, buffer.stride(), &class_ids, width, |out, row| {
        for (dst, &id) in out.chunks_exact_mut(3).zip(row) {
            dst.copy_from_slice(&palette[id as usize]);
        }
    });

    let classes = palette.len();
    let tallies = parallel::reduce_rows(
        &class_ids,
        width,
        || vec![0u64; classes],
        |row| {
            let mut partial = vec![0u64; classes];
            for &id in row {
                partial[id as usize] += 1;
            }
            partial
        },
        |mut a, b| {
            for (x, y) in a.iter_mut().zip(b) {
                *x += y;
            }
            a
        },
    );

    let labels: Vec<String> = rules
        .rules()
        .iter()
        .map(|rule| rule.label.clone())
        .chain(std::iter::once(UNKNOWN_LABEL.to_string()))
        .collect();
    let counts = ClassCounts {
        entries: labels.iter().cloned().zip(tallies).collect(),
    };

    Ok(Classification {
        map: PixelBuffer::new(buffer.width, buffer.height, pixels)?,
        class_ids,
        labels,
        counts,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
