//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! Categorical mappings are total over their option lists and fail loudly
//! on anything else.

pub mod features;
mod patient;
pub mod reference;
mod verdict;

pub use features::{
    encode, encode_answers, Category, EncodedFeatures, EncodingError, RawAnswers, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use patient::{Answer, Education, Gender, PatientProfile};
pub use reference::{reference_table, Metric, MetricReading, ReferenceRange, SeverityTier};
pub use verdict::{Assessment, RiskLabel, RiskVerdict};

/// Widget bounds for each numeric answer.
pub mod bounds {
    pub use super::patient::{
        AGE_YEARS, BMI, CIGS_PER_DAY, DIASTOLIC_BP, GLUCOSE, HEART_RATE, SYSTOLIC_BP,
        TOTAL_CHOLESTEROL,
    };
}
