//! Common error types for CRS

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for CRS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure errors (startup, configuration, artifacts)
///
/// Request-level conditions such as malformed input or unknown labels have
/// their own types next to the code that raises them.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error in a configuration file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Artifact is missing or is not valid JSON of the expected shape
    #[error("Artifact error ({path}): {reason}")]
    Artifact { path: PathBuf, reason: String },

    /// Artifact parsed but its parameters are unusable
    #[error("Invalid artifact ({path}): {defect}")]
    InvalidArtifact {
        path: PathBuf,
        #[source]
        defect: ArtifactDefect,
    },
}

/// Structural problem found while validating a loaded artifact
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactDefect {
    #[error("feature {feature}: non-finite parameter")]
    NonFinite { feature: usize },

    #[error("feature {feature}: min {min} exceeds max {max}")]
    InvertedRange { feature: usize, min: f64, max: f64 },

    #[error("feature {feature}: negative std {std}")]
    NegativeStd { feature: usize, std: f64 },

    #[error("model expects {found} features, pipeline produces {expected}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("forest has no trees")]
    EmptyForest,

    #[error("node {node}: feature index {feature} out of range")]
    FeatureOutOfRange { node: String, feature: usize },

    #[error("node {node}: non-finite threshold")]
    NonFiniteThreshold { node: String },
}

impl Error {
    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Artifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(path: impl Into<PathBuf>, defect: ArtifactDefect) -> Self {
        Error::InvalidArtifact {
            path: path.into(),
            defect,
        }
    }
}
