//! Material classification WASM bindings.
//!
//! Rules are passed as plain JS objects:
//!
//! ```typescript
//! const rules = [
//!   { label: 'GNT', red: [150, 222], green: [146, 228], blue: [145, 222] },
//!   { label: 'Asphalt', red: [20, 90], green: [20, 90], blue: [20, 95], color: [155, 89, 182] },
//! ];
//! const result = classify_image(bytes, rules);
//! console.log(result.percentages()); // { GNT: 12.5, Asphalt: 40.0, Unknown: 47.5 }
//! ```

use sitediff_core::decode::load_from_bytes;
use sitediff_core::encode::encode_png;
use sitediff_core::{
    classify, ClassCounts, ClassPercentages, ClassificationRule, ClassifyError, PipelineError,
    RuleSet,
};
use wasm_bindgen::prelude::*;

use crate::types::{to_js_error, to_js_value};

/// Rendered class map plus per-label counts and percentages.
#[wasm_bindgen]
pub struct JsClassification {
    width: u32,
    height: u32,
    classified_png: Vec<u8>,
    counts: ClassCounts,
    percentages: ClassPercentages,
}

#[wasm_bindgen]
impl JsClassification {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG-encoded class map.
    pub fn classified_png(&self) -> Vec<u8> {
        self.classified_png.clone()
    }

    /// `{ label: count }` in rule order, then `Unknown`.
    pub fn counts(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.counts)
    }

    /// `{ label: percentage }`, rounded to two decimals.
    pub fn percentages(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.percentages)
    }
}

/// Classify an encoded capture.
///
/// `rules` is an array of rule objects; `undefined` or `null` selects
/// [`default_rules`].
///
/// # Errors
///
/// Returns a string prefixed with the error kind: `InvalidInput` for a
/// malformed rule set, `Decode` for an unreadable capture.
#[wasm_bindgen]
pub fn classify_image(bytes: &[u8], rules: JsValue) -> Result<JsClassification, JsValue> {
    let rules = if rules.is_undefined() || rules.is_null() {
        RuleSet::construction_site()
    } else {
        let parsed: Vec<ClassificationRule> = serde_wasm_bindgen::from_value(rules)
            .map_err(|e| ClassifyError::InvalidJson(e.to_string()))
            .map_err(|e| to_js_error(&PipelineError::from(e)))?;
        RuleSet::new(parsed).map_err(|e| to_js_error(&PipelineError::from(e)))?
    };
    classify_bytes(bytes, &rules).map_err(|e| to_js_error(&e))
}

/// The built-in construction-site rules (GNT, Clay, Asphalt).
#[wasm_bindgen]
pub fn default_rules() -> Result<JsValue, JsValue> {
    to_js_value(&RuleSet::construction_site())
}

pub(crate) fn classify_bytes(
    bytes: &[u8],
    rules: &RuleSet,
) -> Result<JsClassification, PipelineError> {
    let image = load_from_bytes(bytes)?;
    let classification = classify(&image, rules)?;
    let classified_png = encode_png(&classification.map.pixels, image.width, image.height)?;

    Ok(JsClassification {
        width: image.width,
        height: image.height,
        classified_png,
        percentages: classification.percentages(),
        counts: classification.counts,
    })
}
