//! Crop catalog: classifier label → crop name

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Class id emitted by the classifier
///
/// The classifier contract does not bound this value; `CropCatalog::resolve`
/// is where the range is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLabel(pub i64);

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label has no catalog entry
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No crop is mapped to class label {0}")]
pub struct UnknownLabel(pub ClassLabel);

/// Crop names indexed by `label - 1`
const CROPS: [&str; 22] = [
    "Rice",
    "Maize",
    "Jute",
    "Cotton",
    "Coconut",
    "Papaya",
    "Orange",
    "Apple",
    "Muskmelon",
    "Watermelon",
    "Grapes",
    "Mango",
    "Banana",
    "Pomegranate",
    "Lentil",
    "Blackgram",
    "Mungbean",
    "Mothbeans",
    "Pigeonpeas",
    "Kidneybeans",
    "Chickpea",
    "Coffee",
];

/// Fixed mapping from labels 1..=22 to crop names
#[derive(Debug, Clone, Copy, Default)]
pub struct CropCatalog;

impl CropCatalog {
    pub const FIRST_LABEL: i64 = 1;
    pub const LAST_LABEL: i64 = CROPS.len() as i64;

    pub fn resolve(&self, label: ClassLabel) -> Result<&'static str, UnknownLabel> {
        if !(Self::FIRST_LABEL..=Self::LAST_LABEL).contains(&label.0) {
            return Err(UnknownLabel(label));
        }
        Ok(CROPS[(label.0 - Self::FIRST_LABEL) as usize])
    }
}
