//! # CRS Common Library
//!
//! Shared code for the Crop Recommendation Service:
//! - Feature vector parsing (fixed seven-field order)
//! - Min-max and standard scalers with type-enforced ordering
//! - Classifier artifact (decision forest) and the `Classifier` capability
//! - Crop catalog (label → crop name)
//! - Artifact loading and bootstrap configuration

pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod scaling;

pub use artifacts::Artifacts;
pub use catalog::{ClassLabel, CropCatalog, UnknownLabel};
pub use error::{ArtifactDefect, Error, Result};
pub use features::{FeatureVector, MalformedInput, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{Classifier, ForestModel};
pub use scaling::{FeaturePipeline, FeatureTransform, MinMaxScaled, MinMaxScaler, StandardScaler, Standardized};
