//! Raw feature vector
//!
//! The classifier and both scalers were fit on columns in a fixed order.
//! `FeatureVector` is the only way to produce that order from submitted form
//! fields, whatever order the client sent them in.

use std::collections::HashMap;
use thiserror::Error;

/// Number of input features
pub const FEATURE_COUNT: usize = 7;

/// Form field names, in model column order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Nitrogen",
    "Phosphorus",
    "Potassium",
    "Temperature",
    "Humidity",
    "pH",
    "Rainfall",
];

/// A submitted field was absent or not a finite number
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedInput {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a number (got {value:?})")]
    NotNumeric { field: &'static str, value: String },
}

impl MalformedInput {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            MalformedInput::Missing { field } | MalformedInput::NotNumeric { field, .. } => *field,
        }
    }
}

/// Seven raw measurements in model column order
///
/// `[Nitrogen, Phosphorus, Potassium, Temperature, Humidity, pH, Rainfall]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Build from submitted form fields, keyed by `FEATURE_NAMES`
    ///
    /// Extra fields are ignored. Surrounding whitespace is tolerated; blank
    /// values count as missing. NaN and infinities are rejected.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, MalformedInput> {
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, field) in values.iter_mut().zip(FEATURE_NAMES) {
            let raw = fields
                .get(field)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or(MalformedInput::Missing { field })?;

            *slot = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MalformedInput::NotNumeric {
                    field,
                    value: raw.to_string(),
                })?;
        }
        Ok(Self(values))
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}
