//! Prediction orchestration
//!
//! session gate → feature parsing → scaling → classifier → crop catalog

use crate::auth::Session;
use crs_common::{Classifier, CropCatalog, FeatureTransform, FeatureVector, MalformedInput};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sentence shown when the classifier's label has no crop
pub const UNDETERMINED_SENTENCE: &str =
    "Sorry, we could not determine the best crop to be cultivated with the provided data.";

/// Why a client is being sent to the login page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReason {
    NotLoggedIn,
    InvalidCredentials,
}

impl LoginReason {
    pub fn notice(&self) -> &'static str {
        match self {
            LoginReason::NotLoggedIn => "You must log in to access this feature.",
            LoginReason::InvalidCredentials => "Invalid credentials. Please try again.",
        }
    }
}

/// Result of a prediction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionOutcome {
    /// Session is anonymous; no pipeline work was done
    RedirectToLogin(LoginReason),
    /// Classifier label resolved to a crop
    Crop(&'static str),
    /// Classifier label is outside the catalog
    Undetermined,
}

impl PredictionOutcome {
    /// User-facing result sentence, if this outcome has one
    pub fn sentence(&self) -> Option<String> {
        match self {
            PredictionOutcome::RedirectToLogin(_) => None,
            PredictionOutcome::Crop(crop) => {
                Some(format!("{} is the best crop to be cultivated right there.", crop))
            }
            PredictionOutcome::Undetermined => Some(UNDETERMINED_SENTENCE.to_string()),
        }
    }
}

/// The loaded pipeline, classifier and catalog, shared read-only by all requests
#[derive(Clone)]
pub struct Recommender {
    pipeline: Arc<dyn FeatureTransform>,
    classifier: Arc<dyn Classifier>,
    catalog: CropCatalog,
}

impl Recommender {
    pub fn new(pipeline: Arc<dyn FeatureTransform>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            pipeline,
            classifier,
            catalog: CropCatalog,
        }
    }

    /// End-to-end predict for one submitted form
    ///
    /// Anonymous sessions are turned away before the form is even parsed.
    pub fn predict(
        &self,
        session: &Session,
        fields: &HashMap<String, String>,
    ) -> Result<PredictionOutcome, MalformedInput> {
        let identity = match session.require_authenticated() {
            Ok(identity) => identity,
            Err(_) => return Ok(PredictionOutcome::RedirectToLogin(LoginReason::NotLoggedIn)),
        };

        let features = FeatureVector::from_form(fields)?;
        let scaled = self.pipeline.transform(features);
        let label = self.classifier.classify(&scaled);

        match self.catalog.resolve(label) {
            Ok(crop) => {
                debug!(user = identity, %label, crop, "Prediction");
                Ok(PredictionOutcome::Crop(crop))
            }
            Err(e) => {
                warn!(user = identity, "{}", e);
                Ok(PredictionOutcome::Undetermined)
            }
        }
    }
}
