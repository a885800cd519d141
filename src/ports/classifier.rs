//! Classifier port: Trait for the pre-trained risk model.
//!
//! This trait abstracts the model artifact from the application logic.

use std::path::PathBuf;

/// Errors from loading or invoking a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Format(String),

    #[error("Model artifact failed integrity check: {0}")]
    Integrity(String),

    #[error("Feature vector shape mismatch: model expects {expected} features, got {got}")]
    Shape { expected: usize, got: usize },

    #[error("Model returned unexpected label {0} (expected 0 or 1)")]
    Label(u8),
}

/// Raw classifier output for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label
    pub label: u8,
    /// Fraction of votes for class 1 (0.0 to 1.0)
    pub risk_share: f64,
}

/// Trait for a loaded binary classifier.
///
/// Implementations are loaded once and shared read-only.
pub trait RiskClassifier: Send + Sync {
    /// Input names in the order the model was trained on.
    fn feature_names(&self) -> &[String];

    /// Number of inputs the model expects.
    fn n_features(&self) -> usize {
        self.feature_names().len()
    }

    /// Classify exactly one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError::Shape` if `features` has the wrong length.
    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError>;
}
