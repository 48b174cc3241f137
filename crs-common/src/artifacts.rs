//! Trained artifact loading
//!
//! The service must not accept requests without all three artifacts, so every
//! problem here is reported as an error for `main` to abort on.

use crate::error::{Error, Result};
use crate::model::ForestModel;
use crate::scaling::{FeaturePipeline, MinMaxScaler, StandardScaler};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

pub const MIN_MAX_FILE: &str = "minmax_scaler.json";
pub const STANDARD_FILE: &str = "standard_scaler.json";
pub const MODEL_FILE: &str = "model.json";

/// The fitted scalers and classifier, loaded once at startup
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub min_max: MinMaxScaler,
    pub standard: StandardScaler,
    pub model: ForestModel,
}

impl Artifacts {
    /// Load and validate all three artifacts from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let min_max: MinMaxScaler = read_json(&dir.join(MIN_MAX_FILE))?;
        min_max
            .validate()
            .map_err(|defect| Error::invalid(dir.join(MIN_MAX_FILE), defect))?;

        let standard: StandardScaler = read_json(&dir.join(STANDARD_FILE))?;
        standard
            .validate()
            .map_err(|defect| Error::invalid(dir.join(STANDARD_FILE), defect))?;

        let model: ForestModel = read_json(&dir.join(MODEL_FILE))?;
        model
            .validate()
            .map_err(|defect| Error::invalid(dir.join(MODEL_FILE), defect))?;

        info!(
            "Loaded artifacts from {} ({} trees, max depth {})",
            dir.display(),
            model.trees.len(),
            model.max_depth()
        );

        Ok(Self {
            min_max,
            standard,
            model,
        })
    }

    /// Split into the feature pipeline and the classifier
    pub fn into_parts(self) -> (FeaturePipeline, ForestModel) {
        (FeaturePipeline::new(self.min_max, self.standard), self.model)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::artifact(path, format!("cannot read: {}", e)))?;
    serde_json::from_str(&content).map_err(|e| Error::artifact(path, format!("invalid JSON: {}", e)))
}
