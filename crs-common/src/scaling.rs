//! Two-stage feature scaling
//!
//! Both scalers were fit at training time: the min-max scaler on raw
//! measurements, the standard scaler on the min-max output. They are only
//! correct when applied in that order, so the stages produce distinct types:
//! `StandardScaler::standardize` accepts nothing but a `MinMaxScaled`.

use crate::error::ArtifactDefect;
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Feature vector after min-max normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaled([f64; FEATURE_COUNT]);

/// Feature vector after min-max normalization followed by standardization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardized([f64; FEATURE_COUNT]);

impl MinMaxScaled {
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

impl Standardized {
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

/// Per-feature min/max captured at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: [f64; FEATURE_COUNT],
    pub data_max: [f64; FEATURE_COUNT],
}

impl MinMaxScaler {
    /// Rescale so the training minimum maps to 0 and maximum to 1
    ///
    /// Values outside the training range extrapolate linearly; nothing is
    /// clamped.
    pub fn normalize(&self, features: FeatureVector) -> MinMaxScaled {
        MinMaxScaled(self.apply(features.as_array()))
    }

    fn apply(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for j in 0..FEATURE_COUNT {
            let range = non_zero(self.data_max[j] - self.data_min[j]);
            out[j] = (x[j] - self.data_min[j]) / range;
        }
        out
    }

    /// Reject non-finite parameters and inverted ranges
    pub fn validate(&self) -> Result<(), ArtifactDefect> {
        for feature in 0..FEATURE_COUNT {
            let (min, max) = (self.data_min[feature], self.data_max[feature]);
            if !min.is_finite() || !max.is_finite() {
                return Err(ArtifactDefect::NonFinite { feature });
            }
            if min > max {
                return Err(ArtifactDefect::InvertedRange { feature, min, max });
            }
        }
        Ok(())
    }
}

/// Per-feature mean/std captured at training time (on min-max output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub std: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// `(x - mean) / std`, component-wise
    pub fn standardize(&self, features: MinMaxScaled) -> Standardized {
        Standardized(self.apply(features.as_array()))
    }

    fn apply(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for j in 0..FEATURE_COUNT {
            out[j] = (x[j] - self.mean[j]) / non_zero(self.std[j]);
        }
        out
    }

    /// Reject non-finite parameters and negative deviations
    pub fn validate(&self) -> Result<(), ArtifactDefect> {
        for feature in 0..FEATURE_COUNT {
            let (mean, std) = (self.mean[feature], self.std[feature]);
            if !mean.is_finite() || !std.is_finite() {
                return Err(ArtifactDefect::NonFinite { feature });
            }
            if std < 0.0 {
                return Err(ArtifactDefect::NegativeStd { feature, std });
            }
        }
        Ok(())
    }
}

/// Constant features were fit with zero spread; scale by 1 like the trainer did.
fn non_zero(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

/// Raw features in, classifier-ready features out
pub trait FeatureTransform: Send + Sync {
    fn transform(&self, features: FeatureVector) -> Standardized;
}

/// The fitted scalers, applied min-max first
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    min_max: MinMaxScaler,
    standard: StandardScaler,
}

impl FeaturePipeline {
    pub fn new(min_max: MinMaxScaler, standard: StandardScaler) -> Self {
        Self { min_max, standard }
    }
}

impl FeatureTransform for FeaturePipeline {
    fn transform(&self, features: FeatureVector) -> Standardized {
        self.standard.standardize(self.min_max.normalize(features))
    }
}
