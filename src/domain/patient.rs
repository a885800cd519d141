//! Patient profile types for 10-year heart disease risk screening.
//!
//! Fields mirror the Framingham Heart Study survey columns the classifier
//! was trained on. Ranges are the bounds of the form widgets.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Age in years.
pub const AGE_YEARS: RangeInclusive<u32> = 20..=100;
/// Cigarettes smoked per day.
pub const CIGS_PER_DAY: RangeInclusive<u32> = 0..=50;
/// Total cholesterol in mg/dL.
pub const TOTAL_CHOLESTEROL: RangeInclusive<u32> = 100..=400;
/// Systolic blood pressure in mm Hg.
pub const SYSTOLIC_BP: RangeInclusive<u32> = 90..=200;
/// Diastolic blood pressure in mm Hg.
pub const DIASTOLIC_BP: RangeInclusive<u32> = 60..=130;
/// Body mass index.
pub const BMI: RangeInclusive<f64> = 10.0..=50.0;
/// Resting heart rate in bpm.
pub const HEART_RATE: RangeInclusive<u32> = 40..=150;
/// Glucose in mg/dL.
pub const GLUCOSE: RangeInclusive<u32> = 60..=300;

/// Self-reported gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Highest academic qualification, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Education {
    HighSchool,
    Undergraduate,
    Postgraduate,
    Phd,
}

/// Answer to a yes/no survey question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl Education {
    pub const ALL: [Education; 4] = [
        Education::HighSchool,
        Education::Undergraduate,
        Education::Postgraduate,
        Education::Phd,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HighSchool => "High school diploma",
            Self::Undergraduate => "Undergraduate degree",
            Self::Postgraduate => "Postgraduate degree",
            Self::Phd => "PhD",
        }
    }
}

impl Answer {
    pub const ALL: [Answer; 2] = [Answer::Yes, Answer::No];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

/// Raw form answers for one person.
///
/// Built fresh on every submission and dropped once the result is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub gender: Gender,
    /// Age in years (20-100)
    pub age: u32,
    pub education: Education,
    pub current_smoker: Answer,
    /// Cigarettes per day (0-50)
    pub cigs_per_day: u32,
    /// Currently on blood pressure medication
    pub bp_meds: Answer,
    /// Has ever had a stroke
    pub prevalent_stroke: Answer,
    /// Diagnosed hypertension
    pub prevalent_hyp: Answer,
    pub diabetes: Answer,
    /// Total cholesterol in mg/dL (100-400)
    pub tot_chol: u32,
    /// Systolic BP in mm Hg (90-200)
    pub sys_bp: u32,
    /// Diastolic BP in mm Hg (60-130)
    pub dia_bp: u32,
    /// Body mass index (10.0-50.0)
    pub bmi: f64,
    /// Resting heart rate in bpm (40-150)
    pub heart_rate: u32,
    /// Glucose in mg/dL (60-300)
    pub glucose: u32,
}

impl Default for PatientProfile {
    /// The untouched form: first option of every choice, every slider at its minimum.
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: *AGE_YEARS.start(),
            education: Education::HighSchool,
            current_smoker: Answer::Yes,
            cigs_per_day: *CIGS_PER_DAY.start(),
            bp_meds: Answer::Yes,
            prevalent_stroke: Answer::Yes,
            prevalent_hyp: Answer::Yes,
            diabetes: Answer::Yes,
            tot_chol: *TOTAL_CHOLESTEROL.start(),
            sys_bp: *SYSTOLIC_BP.start(),
            dia_bp: *DIASTOLIC_BP.start(),
            bmi: *BMI.start(),
            heart_rate: *HEART_RATE.start(),
            glucose: *GLUCOSE.start(),
        }
    }
}

impl PatientProfile {
    /// Sample profile: 45yo male non-smoker with readings inside healthy ranges.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            gender: Gender::Male,
            age: 45,
            education: Education::Undergraduate,
            current_smoker: Answer::No,
            cigs_per_day: 0,
            bp_meds: Answer::No,
            prevalent_stroke: Answer::No,
            prevalent_hyp: Answer::No,
            diabetes: Answer::No,
            tot_chol: 190,
            sys_bp: 115,
            dia_bp: 75,
            bmi: 22.0,
            heart_rate: 70,
            glucose: 90,
        }
    }

    /// Validate that every numeric answer is inside its widget range.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_range(&mut errors, "Age", self.age, &AGE_YEARS);
        check_range(&mut errors, "Cigarettes per day", self.cigs_per_day, &CIGS_PER_DAY);
        check_range(&mut errors, "Cholesterol", self.tot_chol, &TOTAL_CHOLESTEROL);
        check_range(&mut errors, "Systolic BP", self.sys_bp, &SYSTOLIC_BP);
        check_range(&mut errors, "Diastolic BP", self.dia_bp, &DIASTOLIC_BP);
        check_range(&mut errors, "Heart rate", self.heart_rate, &HEART_RATE);
        check_range(&mut errors, "Glucose", self.glucose, &GLUCOSE);

        if !self.bmi.is_finite() || !BMI.contains(&self.bmi) {
            errors.push(format!(
                "BMI {} out of range [{}, {}]",
                self.bmi,
                BMI.start(),
                BMI.end()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_range(errors: &mut Vec<String>, name: &str, value: u32, range: &RangeInclusive<u32>) {
    if !range.contains(&value) {
        errors.push(format!(
            "{name} {value} out of range [{}, {}]",
            range.start(),
            range.end()
        ));
    }
}
