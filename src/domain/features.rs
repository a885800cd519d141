//! Feature encoding: categorical answers to the classifier's numeric vector.

use std::str::FromStr;

use serde::Serialize;

use super::patient::{Answer, Education, Gender, PatientProfile};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 15;

/// Model input names, in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "male",
    "age",
    "education",
    "currentSmoker",
    "cigsPerDay",
    "BPMeds",
    "prevalentStroke",
    "prevalentHyp",
    "diabetes",
    "totChol",
    "sysBP",
    "diaBP",
    "BMI",
    "heartRate",
    "glucose",
];

/// Errors raised while mapping answers to model inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodingError {
    /// A category label outside the closed option list. Always a caller bug.
    #[error("Unknown {field} category: {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("Expected {expected} features, got {got}")]
    Length { expected: usize, got: usize },
}

/// A closed set of survey answers with a fixed numeric code.
pub trait Category: Copy + Sized + 'static {
    /// Survey field this category belongs to (for error messages).
    const FIELD: &'static str;

    /// Every option, in display order.
    fn options() -> &'static [Self];

    /// Label shown in the form and submitted by the form.
    fn label(self) -> &'static str;

    /// Numeric code fed to the model.
    fn code(self) -> u8;

    /// Parse an option from its label.
    ///
    /// # Errors
    /// Returns `EncodingError::UnknownCategory` for any label not in `options()`.
    fn from_label(value: &str) -> Result<Self, EncodingError> {
        Self::options()
            .iter()
            .copied()
            .find(|option| option.label() == value)
            .ok_or_else(|| EncodingError::UnknownCategory {
                field: Self::FIELD,
                value: value.to_string(),
            })
    }
}

impl Category for Gender {
    const FIELD: &'static str = "gender";

    fn options() -> &'static [Self] {
        &Gender::ALL
    }

    fn label(self) -> &'static str {
        Gender::label(self)
    }

    fn code(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female => 0,
        }
    }
}

impl Category for Education {
    const FIELD: &'static str = "education";

    fn options() -> &'static [Self] {
        &Education::ALL
    }

    fn label(self) -> &'static str {
        Education::label(self)
    }

    fn code(self) -> u8 {
        match self {
            Self::HighSchool => 0,
            Self::Undergraduate => 1,
            Self::Postgraduate => 2,
            Self::Phd => 3,
        }
    }
}

impl Category for Answer {
    const FIELD: &'static str = "yes/no";

    fn options() -> &'static [Self] {
        &Answer::ALL
    }

    fn label(self) -> &'static str {
        Answer::label(self)
    }

    fn code(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }
}

impl FromStr for Gender {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl FromStr for Education {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl FromStr for Answer {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

/// Model input vector, ordered as `FEATURE_NAMES`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodedFeatures([f64; FEATURE_COUNT]);

impl EncodedFeatures {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Rebuild a vector from raw values.
    ///
    /// # Errors
    /// Returns error if the slice is not exactly `FEATURE_COUNT` long.
    pub fn from_vec(v: &[f64]) -> Result<Self, EncodingError> {
        let values: [f64; FEATURE_COUNT] =
            v.try_into().map_err(|_| EncodingError::Length {
                expected: FEATURE_COUNT,
                got: v.len(),
            })?;
        Ok(Self(values))
    }
}

/// Encode a profile into the model's input vector.
#[must_use]
pub fn encode(profile: &PatientProfile) -> EncodedFeatures {
    EncodedFeatures([
        f64::from(profile.gender.code()),
        f64::from(profile.age),
        f64::from(profile.education.code()),
        f64::from(profile.current_smoker.code()),
        f64::from(profile.cigs_per_day),
        f64::from(profile.bp_meds.code()),
        f64::from(profile.prevalent_stroke.code()),
        f64::from(profile.prevalent_hyp.code()),
        f64::from(profile.diabetes.code()),
        f64::from(profile.tot_chol),
        f64::from(profile.sys_bp),
        f64::from(profile.dia_bp),
        profile.bmi,
        f64::from(profile.heart_rate),
        f64::from(profile.glucose),
    ])
}

/// Form answers as submitted: categories as their option labels.
#[derive(Debug, Clone, Default)]
pub struct RawAnswers {
    pub gender: String,
    pub age: u32,
    pub education: String,
    pub current_smoker: String,
    pub cigs_per_day: u32,
    pub bp_meds: String,
    pub prevalent_stroke: String,
    pub prevalent_hyp: String,
    pub diabetes: String,
    pub tot_chol: u32,
    pub sys_bp: u32,
    pub dia_bp: u32,
    pub bmi: f64,
    pub heart_rate: u32,
    pub glucose: u32,
}

impl RawAnswers {
    /// Parse every category label into a typed profile.
    ///
    /// # Errors
    /// Returns the first `EncodingError::UnknownCategory` encountered.
    pub fn to_profile(&self) -> Result<PatientProfile, EncodingError> {
        Ok(PatientProfile {
            gender: self.gender.parse()?,
            age: self.age,
            education: self.education.parse()?,
            current_smoker: self.current_smoker.parse()?,
            cigs_per_day: self.cigs_per_day,
            bp_meds: self.bp_meds.parse()?,
            prevalent_stroke: self.prevalent_stroke.parse()?,
            prevalent_hyp: self.prevalent_hyp.parse()?,
            diabetes: self.diabetes.parse()?,
            tot_chol: self.tot_chol,
            sys_bp: self.sys_bp,
            dia_bp: self.dia_bp,
            bmi: self.bmi,
            heart_rate: self.heart_rate,
            glucose: self.glucose,
        })
    }
}

impl From<&PatientProfile> for RawAnswers {
    fn from(profile: &PatientProfile) -> Self {
        Self {
            gender: profile.gender.label().to_string(),
            age: profile.age,
            education: profile.education.label().to_string(),
            current_smoker: profile.current_smoker.label().to_string(),
            cigs_per_day: profile.cigs_per_day,
            bp_meds: profile.bp_meds.label().to_string(),
            prevalent_stroke: profile.prevalent_stroke.label().to_string(),
            prevalent_hyp: profile.prevalent_hyp.label().to_string(),
            diabetes: profile.diabetes.label().to_string(),
            tot_chol: profile.tot_chol,
            sys_bp: profile.sys_bp,
            dia_bp: profile.dia_bp,
            bmi: profile.bmi,
            heart_rate: profile.heart_rate,
            glucose: profile.glucose,
        }
    }
}

/// Encode string answers straight to the model's input vector.
///
/// # Errors
/// Fails on any category label outside its option list.
pub fn encode_answers(raw: &RawAnswers) -> Result<EncodedFeatures, EncodingError> {
    raw.to_profile().map(|profile| encode(&profile))
}
