//! Forest adapter: Implementation of RiskClassifier over a JSON random forest.
//!
//! The artifact is exported from the training pipeline as a list of
//! decision trees. Each tree sends a sample left when
//! `x[feature_idx] <= threshold`, and the forest takes a majority vote.
//!
//! # Integrity
//!
//! When a `manifest.json` sits next to the artifact, every file it lists is
//! hashed with SHA-256 and must match before the model is parsed. A missing
//! manifest only produces a warning.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::FEATURE_NAMES;
use crate::ports::{ModelError, Prediction, RiskClassifier};

/// File name looked up when a directory is given.
pub const DEFAULT_MODEL_FILE: &str = "fhs_forest.json";

const MANIFEST_FILE: &str = "manifest.json";
const SUPPORTED_VERSION: u32 = 1;

/// Deeper trees than this are treated as a corrupt artifact.
const MAX_TREE_DEPTH: usize = 64;

/// Internal decision node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Samples with `x[feature_idx] <= threshold` go left
    pub threshold: f64,
    pub left: Box<TreeNode>,
    pub right: Box<TreeNode>,
}

/// Terminal node carrying the predicted class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaf {
    pub class_label: u8,
    /// Training samples that reached this leaf
    pub n_samples: usize,
}

/// A node in a decision tree (either internal node or leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Node(Node),
    Leaf(Leaf),
}

impl TreeNode {
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    fn predict_one(&self, x: &[f64]) -> u8 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf.class_label,
                TreeNode::Node(internal) => {
                    node = if x[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }

    fn validate(&self, n_features: usize, n_classes: u8, depth: usize) -> Result<(), ModelError> {
        if depth > MAX_TREE_DEPTH {
            return Err(ModelError::Format(format!(
                "tree deeper than {MAX_TREE_DEPTH} levels"
            )));
        }
        match self {
            TreeNode::Leaf(leaf) => {
                if leaf.class_label >= n_classes {
                    return Err(ModelError::Format(format!(
                        "leaf class {} outside 0..{n_classes}",
                        leaf.class_label
                    )));
                }
                Ok(())
            }
            TreeNode::Node(node) => {
                if node.feature_idx >= n_features {
                    return Err(ModelError::Format(format!(
                        "split on feature {} but model has {n_features} features",
                        node.feature_idx
                    )));
                }
                if !node.threshold.is_finite() {
                    return Err(ModelError::Format("non-finite split threshold".into()));
                }
                node.left.validate(n_features, n_classes, depth + 1)?;
                node.right.validate(n_features, n_classes, depth + 1)
            }
        }
    }
}

/// Model artifact as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    pub version: u32,
    pub feature_names: Vec<String>,
    pub n_classes: u8,
    pub trees: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ModelManifest {
    version: u32,
    files: BTreeMap<String, String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Manifest entries must stay inside the model directory.
fn manifest_entry(rel: &str) -> Result<&Path, ModelError> {
    let path = Path::new(rel);
    let contained = path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if contained {
        Ok(path)
    } else {
        Err(ModelError::Integrity(format!(
            "manifest entry {rel:?} escapes the model directory"
        )))
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ModelError> {
    fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Random forest classifier loaded from a JSON artifact.
#[derive(Debug)]
pub struct ForestClassifier {
    model: ForestModel,
}

impl ForestClassifier {
    /// Load and validate a forest artifact.
    ///
    /// `path` may be the artifact itself or a directory containing
    /// `fhs_forest.json`.
    ///
    /// # Errors
    /// Returns error if the file is missing, fails its manifest check,
    /// or does not describe a valid 15-feature binary forest.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model_path = if path.is_dir() {
            path.join(DEFAULT_MODEL_FILE)
        } else {
            path.to_path_buf()
        };

        let bytes = read_file(&model_path)?;
        Self::verify_manifest(&model_path, &bytes)?;

        let model: ForestModel = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Format(e.to_string()))?;

        let classifier = Self::from_model(model)?;

        tracing::info!(
            "Loaded model from {:?} (n_trees={}, n_features={}, max_depth={})",
            model_path,
            classifier.n_trees(),
            classifier.n_features(),
            classifier.max_depth()
        );

        Ok(classifier)
    }

    /// Wrap an in-memory model after validating it.
    ///
    /// # Errors
    /// Returns error if the model is structurally invalid or its inputs
    /// are not the survey features in training order.
    pub fn from_model(model: ForestModel) -> Result<Self, ModelError> {
        if model.version != SUPPORTED_VERSION {
            return Err(ModelError::Format(format!(
                "unsupported model version {}",
                model.version
            )));
        }
        if model.n_classes != 2 {
            return Err(ModelError::Format(format!(
                "expected a binary classifier, got {} classes",
                model.n_classes
            )));
        }
        if model.trees.is_empty() {
            return Err(ModelError::Format("forest has no trees".into()));
        }
        if model.feature_names.len() != FEATURE_NAMES.len() {
            return Err(ModelError::Shape {
                expected: FEATURE_NAMES.len(),
                got: model.feature_names.len(),
            });
        }
        for (idx, (got, want)) in model.feature_names.iter().zip(FEATURE_NAMES).enumerate() {
            if got != want {
                return Err(ModelError::Format(format!(
                    "feature {idx} is {got:?}, expected {want:?}"
                )));
            }
        }

        let n_features = model.feature_names.len();
        for tree in &model.trees {
            tree.validate(n_features, model.n_classes, 0)?;
        }

        Ok(Self { model })
    }

    /// Check `manifest.json` next to the artifact, if present.
    ///
    /// The model entry is checked against `model_bytes`, the exact bytes
    /// that will be parsed.
    fn verify_manifest(model_path: &Path, model_bytes: &[u8]) -> Result<(), ModelError> {
        let base_dir = model_path.parent().unwrap_or_else(|| Path::new("."));
        let manifest_path = base_dir.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            tracing::warn!(
                "No {} next to {:?}; loading model without integrity check",
                MANIFEST_FILE,
                model_path
            );
            return Ok(());
        }

        let manifest: ModelManifest = serde_json::from_slice(&read_file(&manifest_path)?)
            .map_err(|e| ModelError::Integrity(format!("invalid manifest: {e}")))?;
        if manifest.version != 1 {
            return Err(ModelError::Integrity(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }

        let model_file = model_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !manifest.files.contains_key(model_file) {
            return Err(ModelError::Integrity(format!(
                "manifest does not list {model_file}"
            )));
        }

        for (rel, expected_hex) in &manifest.files {
            let actual_hex = if rel == model_file {
                sha256_hex(model_bytes)
            } else {
                sha256_hex(&read_file(&base_dir.join(manifest_entry(rel)?))?)
            };
            if !actual_hex.eq_ignore_ascii_case(expected_hex.trim()) {
                return Err(ModelError::Integrity(format!("hash mismatch for {rel}")));
            }
        }

        tracing::info!("Model manifest hashes verified");
        Ok(())
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.model.trees.len()
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.model.trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }
}

impl RiskClassifier for ForestClassifier {
    fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        if features.len() != self.n_features() {
            return Err(ModelError::Shape {
                expected: self.n_features(),
                got: features.len(),
            });
        }

        let mut votes = vec![0usize; usize::from(self.model.n_classes)];
        for tree in &self.model.trees {
            votes[usize::from(tree.predict_one(features))] += 1;
        }

        // Ties go to the higher class.
        let mut label = 0u8;
        for (class, &count) in votes.iter().enumerate() {
            if count >= votes[usize::from(label)] {
                label = class as u8;
            }
        }

        Ok(Prediction {
            label,
            risk_share: votes[1] as f64 / self.n_trees() as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{encode, PatientProfile};
    use tempfile::tempdir;

    fn leaf(class_label: u8) -> Box<TreeNode> {
        Box::new(TreeNode::Leaf(Leaf {
            class_label,
            n_samples: 10,
        }))
    }

    fn stump(feature_idx: usize, threshold: f64) -> TreeNode {
        TreeNode::Node(Node {
            feature_idx,
            threshold,
            left: leaf(0),
            right: leaf(1),
        })
    }

    fn model(trees: Vec<TreeNode>) -> ForestModel {
        ForestModel {
            version: 1,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            n_classes: 2,
            trees,
        }
    }

    fn write_model(dir: &Path, model: &ForestModel) -> Vec<u8> {
        let bytes = serde_json::to_vec(model).expect("serialize model");
        fs::write(dir.join(DEFAULT_MODEL_FILE), &bytes).expect("write model");
        bytes
    }

    fn write_manifest(dir: &Path, files: &[(&str, String)]) {
        let manifest = ModelManifest {
            version: 1,
            files: files
                .iter()
                .map(|(name, hash)| (name.to_string(), hash.clone()))
                .collect(),
        };
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).expect("serialize manifest"),
        )
        .expect("write manifest");
    }

    #[test]
    fn test_majority_vote() {
        // age <= 50, sysBP <= 140, glucose <= 125
        let classifier = ForestClassifier::from_model(model(vec![
            stump(1, 50.0),
            stump(10, 140.0),
            stump(14, 125.0),
        ]))
        .expect("Valid model");

        let young = encode(&PatientProfile::sample());
        let p = classifier.predict(young.as_slice()).expect("Should predict");
        assert_eq!(p.label, 0);
        assert!(p.risk_share.abs() < f64::EPSILON);

        let older = encode(&PatientProfile {
            age: 70,
            sys_bp: 160,
            ..PatientProfile::sample()
        });
        let p = classifier.predict(older.as_slice()).expect("Should predict");
        assert_eq!(p.label, 1);
        assert!((p.risk_share - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_high_risk() {
        let classifier =
            ForestClassifier::from_model(model(vec![stump(1, 50.0), stump(1, 30.0)]))
                .expect("Valid model");
        let features = encode(&PatientProfile::sample());
        let p = classifier.predict(features.as_slice()).expect("Should predict");
        assert_eq!(p.label, 1);
        assert!((p.risk_share - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let classifier =
            ForestClassifier::from_model(model(vec![stump(1, 45.0)])).expect("Valid model");
        let features = encode(&PatientProfile::sample());
        assert_eq!(classifier.predict(features.as_slice()).map(|p| p.label).ok(), Some(0));
    }

    #[test]
    fn test_predict_rejects_wrong_shape() {
        let classifier =
            ForestClassifier::from_model(model(vec![stump(1, 50.0)])).expect("Valid model");
        let err = classifier.predict(&[1.0; 9]).expect_err("Should reject");
        assert!(matches!(err, ModelError::Shape { expected: 15, got: 9 }));
    }

    #[test]
    fn test_rejects_empty_forest() {
        assert!(matches!(
            ForestClassifier::from_model(model(vec![])),
            Err(ModelError::Format(_))
        ));
    }

    #[test]
    fn test_rejects_feature_order_mismatch() {
        let mut m = model(vec![stump(1, 50.0)]);
        m.feature_names.swap(0, 1);
        let err = ForestClassifier::from_model(m).expect_err("Should reject");
        assert!(err.to_string().contains("feature 0"));
    }

    #[test]
    fn test_rejects_wrong_feature_count() {
        let mut m = model(vec![stump(1, 50.0)]);
        m.feature_names.truncate(9);
        assert!(matches!(
            ForestClassifier::from_model(m),
            Err(ModelError::Shape { expected: 15, got: 9 })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_split_and_label() {
        assert!(ForestClassifier::from_model(model(vec![stump(15, 1.0)])).is_err());

        let bad_leaf = TreeNode::Node(Node {
            feature_idx: 0,
            threshold: 0.5,
            left: leaf(0),
            right: leaf(2),
        });
        assert!(ForestClassifier::from_model(model(vec![bad_leaf])).is_err());
        assert!(ForestClassifier::from_model(model(vec![stump(0, f64::NAN)])).is_err());
    }

    #[test]
    fn test_load_from_directory_without_manifest() {
        let dir = tempdir().expect("tempdir");
        write_model(dir.path(), &model(vec![stump(1, 50.0)]));

        let classifier = ForestClassifier::load(dir.path()).expect("Should load");
        assert_eq!(classifier.n_trees(), 1);
        assert_eq!(classifier.max_depth(), 1);
    }

    #[test]
    fn test_load_verifies_manifest_hashes() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_model(dir.path(), &model(vec![stump(1, 50.0)]));
        write_manifest(dir.path(), &[(DEFAULT_MODEL_FILE, sha256_hex(&bytes))]);

        assert!(ForestClassifier::load(dir.path()).is_ok());
    }

    #[test]
    fn test_load_rejects_tampered_model() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_model(dir.path(), &model(vec![stump(1, 50.0)]));
        write_manifest(dir.path(), &[(DEFAULT_MODEL_FILE, sha256_hex(&bytes))]);

        // Replace the model after the manifest was written.
        write_model(dir.path(), &model(vec![stump(1, 20.0)]));

        let err = ForestClassifier::load(dir.path()).expect_err("Should reject");
        assert!(matches!(err, ModelError::Integrity(_)));
    }

    #[test]
    fn test_load_rejects_manifest_not_listing_model() {
        let dir = tempdir().expect("tempdir");
        write_model(dir.path(), &model(vec![stump(1, 50.0)]));
        fs::write(dir.path().join("notes.txt"), b"hello").expect("write");
        write_manifest(dir.path(), &[("notes.txt", sha256_hex(b"hello"))]);

        assert!(matches!(
            ForestClassifier::load(dir.path()),
            Err(ModelError::Integrity(_))
        ));
    }

    #[test]
    fn test_load_rejects_manifest_entries_outside_model_dir() {
        let dir = tempdir().expect("tempdir");
        let model_dir = dir.path().join("model");
        fs::create_dir(&model_dir).expect("mkdir");
        let bytes = write_model(&model_dir, &model(vec![stump(1, 50.0)]));
        fs::write(dir.path().join("outside.txt"), b"hello").expect("write");

        for entry in ["../outside.txt", "/etc/hostname", "sub/../../outside.txt"] {
            write_manifest(
                &model_dir,
                &[
                    (DEFAULT_MODEL_FILE, sha256_hex(&bytes)),
                    (entry, sha256_hex(b"hello")),
                ],
            );
            let err = ForestClassifier::load(&model_dir).expect_err("Should reject");
            assert!(
                matches!(&err, ModelError::Integrity(msg) if msg.contains("escapes")),
                "{entry}: {err}"
            );
        }
    }

    #[test]
    fn test_manifest_entry_accepts_nested_relative_paths() {
        assert!(manifest_entry("fhs_forest.json").is_ok());
        assert!(manifest_entry("extra/scaler.json").is_ok());
        assert!(manifest_entry("").is_err());
        assert!(manifest_entry("./fhs_forest.json").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().expect("tempdir");
        let err = ForestClassifier::load(&dir.path().join("absent.json")).expect_err("Missing");
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(DEFAULT_MODEL_FILE), b"not a model").expect("write");
        assert!(matches!(
            ForestClassifier::load(dir.path()),
            Err(ModelError::Format(_))
        ));
    }

    #[test]
    fn test_bundled_model_loads_and_verifies() {
        let classifier = ForestClassifier::load(Path::new("models")).expect("Bundled model");
        assert_eq!(classifier.n_features(), 15);
        assert_eq!(classifier.n_trees(), 5);
    }
}
