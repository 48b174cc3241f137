//! Classifier capability and the decision-forest artifact
//!
//! The serving core only needs `Classifier::classify`. `ForestModel` is the
//! adapter for the exported ensemble: a list of binary trees, each voting for
//! one label.

use crate::catalog::ClassLabel;
use crate::error::ArtifactDefect;
use crate::features::FEATURE_COUNT;
use crate::scaling::Standardized;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trained classifier over fully scaled features
///
/// Implementations must be deterministic and must not learn at serve time.
pub trait Classifier: Send + Sync {
    fn classify(&self, features: &Standardized) -> ClassLabel;
}

/// A node in an exported decision tree
///
/// Samples with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        label: ClassLabel,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> ClassLabel {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { label } => return *label,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left.as_ref() } else { right.as_ref() };
                }
            }
        }
    }

    /// Leaves have depth 0
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn validate(&self, path: &mut String) -> Result<(), ArtifactDefect> {
        match self {
            TreeNode::Leaf { .. } => Ok(()),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(ArtifactDefect::FeatureOutOfRange {
                        node: path.clone(),
                        feature: *feature,
                    });
                }
                if !threshold.is_finite() {
                    return Err(ArtifactDefect::NonFiniteThreshold { node: path.clone() });
                }
                path.push('L');
                left.validate(path)?;
                path.pop();
                path.push('R');
                right.validate(path)?;
                path.pop();
                Ok(())
            }
        }
    }
}

/// Majority-vote ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub n_features: usize,
    pub trees: Vec<TreeNode>,
}

impl ForestModel {
    /// Structural checks run once at load time, so `classify` can index freely
    pub fn validate(&self) -> Result<(), ArtifactDefect> {
        if self.n_features != FEATURE_COUNT {
            return Err(ArtifactDefect::FeatureCountMismatch {
                expected: FEATURE_COUNT,
                found: self.n_features,
            });
        }
        if self.trees.is_empty() {
            return Err(ArtifactDefect::EmptyForest);
        }
        for (i, tree) in self.trees.iter().enumerate() {
            let mut path = format!("tree[{i}]/");
            tree.validate(&mut path)?;
        }
        Ok(())
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }
}

impl Classifier for ForestModel {
    /// Most-voted label; ties go to the smallest label
    fn classify(&self, features: &Standardized) -> ClassLabel {
        let mut votes: BTreeMap<ClassLabel, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(features.as_array())).or_default() += 1;
        }

        let mut best: Option<(ClassLabel, usize)> = None;
        for (label, count) in votes {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((label, count));
            }
        }
        // An empty forest is rejected by validate(); label 0 is never in the catalog.
        best.map(|(label, _)| label).unwrap_or(ClassLabel(0))
    }
}
