//! Healthy reference ranges and severity tiers for display.
//!
//! Nothing here is fed to the classifier.

use serde::{Deserialize, Serialize};

use super::patient::PatientProfile;

/// Units above the healthy upper bound still counted as borderline.
///
/// Applied to every metric regardless of unit.
pub const SEVERITY_MARGIN: f64 = 20.0;

/// Continuous readings shown against a reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Cholesterol,
    SystolicBp,
    DiastolicBp,
    Bmi,
    HeartRate,
    Glucose,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Cholesterol,
        Metric::SystolicBp,
        Metric::DiastolicBp,
        Metric::Bmi,
        Metric::HeartRate,
        Metric::Glucose,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cholesterol => "Cholesterol (mg/dL)",
            Self::SystolicBp => "Systolic BP (mm Hg)",
            Self::DiastolicBp => "Diastolic BP (mm Hg)",
            Self::Bmi => "BMI",
            Self::HeartRate => "Resting Heart Rate (bpm)",
            Self::Glucose => "Glucose (mg/dL)",
        }
    }

    /// Compact label for chart axes.
    #[must_use]
    pub fn short_label(self) -> &'static str {
        match self {
            Self::Cholesterol => "Chol",
            Self::SystolicBp => "SysBP",
            Self::DiastolicBp => "DiaBP",
            Self::Bmi => "BMI",
            Self::HeartRate => "HR",
            Self::Glucose => "Gluc",
        }
    }

    #[must_use]
    pub fn healthy_range(self) -> ReferenceRange {
        match self {
            Self::Cholesterol => ReferenceRange::new(125.0, 200.0),
            Self::SystolicBp => ReferenceRange::new(90.0, 120.0),
            Self::DiastolicBp => ReferenceRange::new(60.0, 80.0),
            Self::Bmi => ReferenceRange::new(18.5, 24.9),
            Self::HeartRate => ReferenceRange::new(60.0, 100.0),
            Self::Glucose => ReferenceRange::new(70.0, 140.0),
        }
    }

    /// Pull this metric's reading out of a profile.
    #[must_use]
    pub fn value_in(self, profile: &PatientProfile) -> f64 {
        match self {
            Self::Cholesterol => f64::from(profile.tot_chol),
            Self::SystolicBp => f64::from(profile.sys_bp),
            Self::DiastolicBp => f64::from(profile.dia_bp),
            Self::Bmi => profile.bmi,
            Self::HeartRate => f64::from(profile.heart_rate),
            Self::Glucose => f64::from(profile.glucose),
        }
    }
}

/// Healthy bounds for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub lower: f64,
    pub upper: f64,
}

impl ReferenceRange {
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Bucket a reading. Only the upper bound matters.
    #[must_use]
    pub fn classify(&self, value: f64) -> SeverityTier {
        if value < self.upper {
            SeverityTier::Healthy
        } else if value <= self.upper + SEVERITY_MARGIN {
            SeverityTier::Borderline
        } else {
            SeverityTier::Elevated
        }
    }
}

/// Display bucket for a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityTier {
    Healthy,
    Borderline,
    Elevated,
}

impl SeverityTier {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Borderline => "borderline",
            Self::Elevated => "elevated",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the reference table: observed value, bounds, tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricReading {
    pub metric: Metric,
    pub value: f64,
    pub range: ReferenceRange,
    pub tier: SeverityTier,
}

impl MetricReading {
    #[must_use]
    pub fn new(metric: Metric, value: f64) -> Self {
        let range = metric.healthy_range();
        Self {
            metric,
            value,
            range,
            tier: range.classify(value),
        }
    }
}

/// Reference table for every metric of a profile, in `Metric::ALL` order.
#[must_use]
pub fn reference_table(profile: &PatientProfile) -> Vec<MetricReading> {
    Metric::ALL
        .iter()
        .map(|&metric| MetricReading::new(metric, metric.value_in(profile)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cholesterol_tiers() {
        let range = Metric::Cholesterol.healthy_range();
        assert_eq!(range.classify(180.0), SeverityTier::Healthy);
        assert_eq!(range.classify(210.0), SeverityTier::Borderline);
        assert_eq!(range.classify(250.0), SeverityTier::Elevated);
    }

    #[test]
    fn test_tier_boundaries() {
        let range = Metric::Cholesterol.healthy_range();
        // Upper bound itself is no longer healthy.
        assert_eq!(range.classify(200.0), SeverityTier::Borderline);
        assert_eq!(range.classify(220.0), SeverityTier::Borderline);
        assert_eq!(range.classify(220.5), SeverityTier::Elevated);
    }

    #[test]
    fn test_margin_is_uniform_across_units() {
        // BMI 40 is far outside the healthy band but within upper + 20.
        assert_eq!(
            Metric::Bmi.healthy_range().classify(40.0),
            SeverityTier::Borderline
        );
        assert_eq!(
            Metric::Bmi.healthy_range().classify(45.0),
            SeverityTier::Elevated
        );
    }

    #[test]
    fn test_lower_bound_does_not_affect_tier() {
        assert_eq!(
            Metric::HeartRate.healthy_range().classify(40.0),
            SeverityTier::Healthy
        );
    }

    #[test]
    fn test_reference_table_for_sample() {
        let table = reference_table(&PatientProfile::sample());
        assert_eq!(table.len(), 6);
        assert!(table.iter().all(|r| r.tier == SeverityTier::Healthy));
        assert_eq!(table[0].metric, Metric::Cholesterol);
        assert!((table[0].value - 190.0).abs() < f64::EPSILON);
        assert!((table[3].range.upper - 24.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reference_table_mixed_tiers() {
        let profile = PatientProfile {
            tot_chol: 250,
            sys_bp: 130,
            ..PatientProfile::sample()
        };
        let table = reference_table(&profile);
        assert_eq!(table[0].tier, SeverityTier::Elevated);
        assert_eq!(table[1].tier, SeverityTier::Borderline);
        assert_eq!(table[2].tier, SeverityTier::Healthy);
    }
}
