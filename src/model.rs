//! Opaque model artifact.
//!
//! The artifact is a versioned bincode envelope produced by the external
//! training pipeline: a format version, the ordered feature-name list the
//! regressor was fit against, and the regressor parameters themselves. This
//! crate only decodes the envelope and walks the regressor; it never trains.
//! Callers see a single capability: `predict(&[f64]) -> f64`.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PriceError;

const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    version: u32,
    feature_names: Vec<String>,
    regressor: Regressor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Regressor {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        trees: Vec<Tree>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Model {
    pub fn load(path: &Path) -> Result<Self, PriceError> {
        let bytes = fs::read(path).map_err(|err| PriceError::resource(path, err.to_string()))?;
        let (model, _): (Model, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|err| PriceError::resource(path, format!("malformed artifact: {err}")))?;
        model
            .validate()
            .map_err(|reason| PriceError::resource(path, reason))?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .context("Encoding model artifact")?;
        fs::write(path, bytes).with_context(|| format!("Writing model artifact {path:?}"))
    }

    /// Assemble a linear artifact. Used by artifact tooling and tests; the
    /// production artifact comes from the external training pipeline.
    pub fn linear(
        feature_names: Vec<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self> {
        let model = Model {
            version: ARTIFACT_VERSION,
            feature_names,
            regressor: Regressor::Linear {
                intercept,
                coefficients,
            },
        };
        model.validate().map_err(anyhow::Error::msg)?;
        Ok(model)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Run inference on one encoded row.
    ///
    /// The row width must match the artifact's feature list; anything the
    /// regressor cannot evaluate is a `PredictionFailure`, never a panic.
    pub fn predict(&self, row: &[f64]) -> Result<f64, PriceError> {
        if row.len() != self.feature_names.len() {
            return Err(PriceError::PredictionFailure(format!(
                "model expects {} feature(s), row has {}",
                self.feature_names.len(),
                row.len()
            )));
        }
        match &self.regressor {
            Regressor::Linear {
                intercept,
                coefficients,
            } => {
                let dot: f64 = coefficients
                    .iter()
                    .zip(row.iter())
                    .map(|(coef, value)| coef * value)
                    .sum();
                Ok(intercept + dot)
            }
            Regressor::Forest { trees } => {
                let mut total = 0.0;
                for tree in trees {
                    total += eval_tree(tree, row)?;
                }
                Ok(total / trees.len() as f64)
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.version != ARTIFACT_VERSION {
            return Err(format!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                self.version
            ));
        }
        if self.feature_names.is_empty() {
            return Err("artifact declares no features".to_string());
        }
        match &self.regressor {
            Regressor::Linear { coefficients, .. } => {
                if coefficients.len() != self.feature_names.len() {
                    return Err(format!(
                        "{} coefficient(s) for {} feature(s)",
                        coefficients.len(),
                        self.feature_names.len()
                    ));
                }
            }
            Regressor::Forest { trees } => {
                if trees.is_empty() {
                    return Err("forest regressor has no trees".to_string());
                }
                for (tree_idx, tree) in trees.iter().enumerate() {
                    if tree.nodes.is_empty() {
                        return Err(format!("tree {tree_idx} has no nodes"));
                    }
                    for node in &tree.nodes {
                        if let Node::Split {
                            feature,
                            left,
                            right,
                            ..
                        } = node
                        {
                            if *feature >= self.feature_names.len()
                                || *left >= tree.nodes.len()
                                || *right >= tree.nodes.len()
                            {
                                return Err(format!("tree {tree_idx} references out-of-range ids"));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn eval_tree(tree: &Tree, row: &[f64]) -> Result<f64, PriceError> {
    let mut node_idx = 0usize;
    // Node indices were range-checked at load; the step bound guards cycles.
    for _ in 0..=tree.nodes.len() {
        match &tree.nodes[node_idx] {
            Node::Leaf { value } => return Ok(*value),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                // NaN comparisons are false, so missing values take the
                // right branch.
                node_idx = if row[*feature] < *threshold {
                    *left
                } else {
                    *right
                };
            }
        }
    }
    Err(PriceError::PredictionFailure(
        "regressor tree does not terminate".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COLUMNS;

    fn feature_names() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn linear_model_predicts_intercept_plus_dot() {
        let mut coefficients = vec![0.0; 11];
        coefficients[1] = 2.0; // year
        coefficients[10] = 100.0; // seats
        let model = Model::linear(feature_names(), 500.0, coefficients).expect("model");
        let mut row = vec![0.0; 11];
        row[1] = 2020.0;
        row[10] = 5.0;
        let price = model.predict(&row).expect("predict");
        assert_eq!(price, 500.0 + 2.0 * 2020.0 + 100.0 * 5.0);
    }

    #[test]
    fn row_width_mismatch_is_a_prediction_failure() {
        let model = Model::linear(feature_names(), 0.0, vec![0.0; 11]).expect("model");
        let err = model.predict(&[1.0, 2.0]).expect_err("short row");
        assert!(matches!(err, PriceError::PredictionFailure(_)));
        assert!(err.to_string().contains("11 feature(s)"));
    }

    #[test]
    fn artifact_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("model.bin");
        let model = Model::linear(feature_names(), 1000.0, vec![1.0; 11]).expect("model");
        model.save(&path).expect("save");

        let loaded = Model::load(&path).expect("load");
        let row = vec![1.0; 11];
        assert_eq!(
            model.predict(&row).expect("predict"),
            loaded.predict(&row).expect("predict loaded")
        );
    }

    #[test]
    fn truncated_artifact_is_resource_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("model.bin");
        let model = Model::linear(feature_names(), 1000.0, vec![1.0; 11]).expect("model");
        model.save(&path).expect("save");

        let bytes = std::fs::read(&path).expect("read");
        std::fs::write(&path, &bytes[..bytes.len() / 2]).expect("truncate");
        let err = Model::load(&path).expect_err("truncated artifact must fail");
        assert!(matches!(err, PriceError::ResourceUnavailable { .. }));
    }

    #[test]
    fn coefficient_count_must_match_feature_count() {
        assert!(Model::linear(feature_names(), 0.0, vec![0.0; 3]).is_err());
    }

    #[test]
    fn forest_averages_trees_and_routes_nan_right() {
        let tree = |leaf_left: f64, leaf_right: f64| Tree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 5.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: leaf_left },
                Node::Leaf { value: leaf_right },
            ],
        };
        let model = Model {
            version: ARTIFACT_VERSION,
            feature_names: vec!["name".to_string()],
            regressor: Regressor::Forest {
                trees: vec![tree(10.0, 20.0), tree(30.0, 40.0)],
            },
        };
        model.validate().expect("valid forest");

        assert_eq!(model.predict(&[1.0]).expect("left"), 20.0);
        assert_eq!(model.predict(&[9.0]).expect("right"), 30.0);
        assert_eq!(model.predict(&[f64::NAN]).expect("nan goes right"), 30.0);
    }
}
