//! # Cardiocheck
//!
//! Terminal form for 10-year heart disease risk screening.
//!
//! This crate provides:
//! - A constrained survey form for one person's health answers
//! - Reference-range visualization of six physiological readings
//! - Prediction against a pre-trained random forest artifact
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientProfile, EncodedFeatures, reference tiers, RiskVerdict)
//! - `ports`: Trait definitions for external collaborators (the classifier)
//! - `adapters`: Concrete implementations (JSON forest model, log sanitization)
//! - `application`: The prediction use case
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{EncodedFeatures, PatientProfile, RiskLabel, RiskVerdict};

/// Result type for Cardiocheck operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for Cardiocheck
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] domain::EncodingError),

    #[error("Invalid patient data: {0}")]
    Validation(String),
}
