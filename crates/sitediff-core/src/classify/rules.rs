//! Ordered color-range rules for material classification.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ClassifyError;

/// Label given to pixels that match no rule. Rule sets may not use it.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Display color for unmatched pixels.
pub const UNKNOWN_COLOR: [u8; 3] = [0, 0, 0];

/// Display colors for rules without an explicit `color`, by rule index.
pub const FALLBACK_PALETTE: [[u8; 3]; 8] = [
    [230, 159, 0],
    [86, 180, 233],
    [0, 158, 115],
    [240, 228, 66],
    [0, 114, 178],
    [213, 94, 0],
    [204, 121, 167],
    [255, 255, 255],
];

/// Inclusive `[min, max]` range over one 8-bit channel.
///
/// Serialized as a two-element array, e.g. `[150, 222]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 2]", into = "[u8; 2]")]
pub struct ChannelRange {
    pub min: u8,
    pub max: u8,
}

impl ChannelRange {
    /// The whole 0..=255 range.
    pub const FULL: ChannelRange = ChannelRange { min: 0, max: 255 };

    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

impl From<[u8; 2]> for ChannelRange {
    fn from([min, max]: [u8; 2]) -> Self {
        Self { min, max }
    }
}

impl From<ChannelRange> for [u8; 2] {
    fn from(range: ChannelRange) -> Self {
        [range.min, range.max]
    }
}

/// A material label with one inclusive range per channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub label: String,
    pub red: ChannelRange,
    pub green: ChannelRange,
    pub blue: ChannelRange,
    /// Display color in the rendered class map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[u8; 3]>,
}

impl ClassificationRule {
    pub fn new(
        label: impl Into<String>,
        red: ChannelRange,
        green: ChannelRange,
        blue: ChannelRange,
    ) -> Self {
        Self {
            label: label.into(),
            red,
            green,
            blue,
            color: None,
        }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = Some(color);
        self
    }

    /// True when all three channels fall within their ranges.
    #[inline]
    pub fn matches(&self, px: &[u8; 3]) -> bool {
        let [r, g, b] = *px;
        self.red.contains(r) && self.green.contains(g) && self.blue.contains(b)
    }
}

/// An ordered list of rules. The first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

impl RuleSet {
    /// Create a rule set, validating labels and ranges.
    pub fn new(rules: Vec<ClassificationRule>) -> Result<Self, ClassifyError> {
        let set = Self { rules };
        set.validate()?;
        Ok(set)
    }

    /// Parse a JSON array of rules, e.g.
    /// `[{"label": "GNT", "red": [150, 222], "green": [146, 228], "blue": [145, 222]}]`.
    pub fn from_json(json: &str) -> Result<Self, ClassifyError> {
        let rules: Vec<ClassificationRule> =
            serde_json::from_str(json).map_err(|e| ClassifyError::InvalidJson(e.to_string()))?;
        Self::new(rules)
    }

    pub fn to_json(&self) -> Result<String, ClassifyError> {
        serde_json::to_string_pretty(self).map_err(|e| ClassifyError::InvalidJson(e.to_string()))
    }

    /// Default rules for earthworks and paving.
    ///
    /// `GNT` is unbound graded aggregate (grave non traitée).
    pub fn construction_site() -> Self {
        Self {
            rules: vec![
                ClassificationRule::new(
                    "GNT",
                    ChannelRange::new(150, 222),
                    ChannelRange::new(146, 228),
                    ChannelRange::new(145, 222),
                )
                .with_color([52, 152, 219]),
                ClassificationRule::new(
                    "Clay",
                    ChannelRange::new(120, 200),
                    ChannelRange::new(80, 150),
                    ChannelRange::new(40, 110),
                )
                .with_color([230, 126, 34]),
                ClassificationRule::new(
                    "Asphalt",
                    ChannelRange::new(20, 90),
                    ChannelRange::new(20, 90),
                    ChannelRange::new(20, 95),
                )
                .with_color([155, 89, 182]),
            ],
        }
    }

    /// Check labels and ranges.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError` for an empty label, the reserved
    /// [`UNKNOWN_LABEL`], a duplicate label, an empty range or more rules than
    /// a class id can address.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.rules.len() >= u16::MAX as usize {
            return Err(ClassifyError::TooManyRules(self.rules.len()));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.label.trim().is_empty() {
                return Err(ClassifyError::EmptyLabel);
            }
            if rule.label == UNKNOWN_LABEL {
                return Err(ClassifyError::ReservedLabel(rule.label.clone()));
            }
            if !seen.insert(rule.label.as_str()) {
                return Err(ClassifyError::DuplicateLabel(rule.label.clone()));
            }
            let channels = [("red", rule.red), ("green", rule.green), ("blue", rule.blue)];
            for (channel, range) in channels {
                if range.is_empty() {
                    return Err(ClassifyError::InvalidRange {
                        label: rule.label.clone(),
                        channel,
                        min: range.min,
                        max: range.max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Append a rule at the lowest precedence.
    pub fn push(&mut self, rule: ClassificationRule) -> Result<(), ClassifyError> {
        self.rules.push(rule);
        if let Err(e) = self.validate() {
            self.rules.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Index of the first rule matching `px`, if any.
    #[inline]
    pub fn first_match(&self, px: &[u8; 3]) -> Option<usize> {
        self.rules.iter().position(|rule| rule.matches(px))
    }

    /// Display color of the rule at `index`.
    pub fn color_of(&self, index: usize) -> [u8; 3] {
        self.rules
            .get(index)
            .and_then(|rule| rule.color)
            .unwrap_or(FALLBACK_PALETTE[index % FALLBACK_PALETTE.len()])
    }
}
