//! Prediction service: Orchestrates one risk prediction.
//!
//! This service coordinates:
//! - Profile validation
//! - Feature encoding
//! - Classifier invocation
//! - Verdict mapping

use std::sync::Arc;
use std::time::Instant;

use crate::domain::{
    encode, Assessment, EncodedFeatures, PatientProfile, RawAnswers, RiskLabel, RiskVerdict,
};
use crate::ports::{ModelError, RiskClassifier};
use crate::CardioError;

/// Service for running the risk classifier on one profile at a time.
///
/// The classifier is loaded by the caller and handed in; the service never
/// loads or caches a model on its own.
pub struct PredictionService<C>
where
    C: RiskClassifier,
{
    classifier: Arc<C>,
}

impl<C> PredictionService<C>
where
    C: RiskClassifier,
{
    /// Create a new prediction service around a loaded classifier.
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// Number of features the loaded classifier expects.
    #[must_use]
    pub fn expected_features(&self) -> usize {
        self.classifier.n_features()
    }

    /// Validate, encode and classify a profile.
    ///
    /// # Errors
    /// Returns error if the profile is out of range or the classifier fails.
    pub fn predict(&self, profile: &PatientProfile) -> crate::Result<Assessment> {
        profile
            .validate()
            .map_err(|errors| CardioError::Validation(errors.join(", ")))?;

        let features = encode(profile);
        self.predict_encoded(&features)
    }

    /// Validate, encode and classify answers given as option labels.
    ///
    /// # Errors
    /// Returns `CardioError::Encoding` for a label outside its option list.
    pub fn predict_answers(&self, answers: &RawAnswers) -> crate::Result<Assessment> {
        let profile = answers.to_profile()?;
        self.predict(&profile)
    }

    /// Classify an already encoded vector.
    ///
    /// # Errors
    /// Returns error if the classifier fails or returns a label other than 0/1.
    pub fn predict_encoded(&self, features: &EncodedFeatures) -> crate::Result<Assessment> {
        self.predict_raw(features.as_slice())
    }

    /// Classify a raw feature slice.
    ///
    /// # Errors
    /// Returns `ModelError::Shape` if the slice length does not match the model.
    pub fn predict_raw(&self, features: &[f64]) -> crate::Result<Assessment> {
        let expected = self.expected_features();
        if features.len() != expected {
            return Err(ModelError::Shape {
                expected,
                got: features.len(),
            }
            .into());
        }

        tracing::debug!("Invoking classifier on {} features", features.len());
        let started = Instant::now();
        let prediction = self.classifier.predict(features)?;
        let latency = started.elapsed();

        let label =
            RiskLabel::from_code(prediction.label).ok_or(ModelError::Label(prediction.label))?;
        let assessment = Assessment::new(RiskVerdict::new(label), prediction.risk_share, latency);

        tracing::info!(
            "Prediction complete: label={}, risk_share={:.2}, latency_us={}",
            label.code(),
            prediction.risk_share,
            latency.as_micros()
        );

        Ok(assessment)
    }
}
