//! Risk verdict types.
//!
//! Represents the interpreted output of the heart disease classifier.

use std::time::Duration;

use serde::Serialize;

/// Binary 10-year heart disease risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    /// Model label 0
    Low,
    /// Model label 1
    High,
}

impl RiskLabel {
    /// Map a raw model label. Anything other than 0/1 is not a verdict.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Main result message.
    #[must_use]
    pub fn headline(self) -> &'static str {
        match self {
            Self::Low => "You are unlikely to develop heart disease in the next 10 years.",
            Self::High => "You are at risk of developing heart disease in the next 10 years.",
        }
    }

    /// Follow-up recommendation.
    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            Self::Low => "Keep maintaining a healthy lifestyle!",
            Self::High => "Please consult a healthcare provider for personalized advice.",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW RISK"),
            Self::High => write!(f, "HIGH RISK"),
        }
    }
}

/// Classifier label plus its user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskVerdict {
    pub label: RiskLabel,
    pub headline: &'static str,
    pub advice: &'static str,
}

impl RiskVerdict {
    #[must_use]
    pub fn new(label: RiskLabel) -> Self {
        Self {
            label,
            headline: label.headline(),
            advice: label.advice(),
        }
    }
}

/// A verdict with the metadata shown alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub verdict: RiskVerdict,

    /// Fraction of the model's voters that chose the high-risk class (0.0 to 1.0)
    pub risk_share: f64,

    /// Wall time spent inside the classifier
    pub latency: Duration,

    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(verdict: RiskVerdict, risk_share: f64, latency: Duration) -> Self {
        Self {
            verdict,
            risk_share,
            latency,
            assessed_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_code() {
        assert_eq!(RiskLabel::from_code(0), Some(RiskLabel::Low));
        assert_eq!(RiskLabel::from_code(1), Some(RiskLabel::High));
        assert_eq!(RiskLabel::from_code(2), None);
    }

    #[test]
    fn test_code_round_trip() {
        for label in [RiskLabel::Low, RiskLabel::High] {
            assert_eq!(RiskLabel::from_code(label.code()), Some(label));
        }
    }

    #[test]
    fn test_high_risk_recommends_consultation() {
        let verdict = RiskVerdict::new(RiskLabel::High);
        assert!(verdict.headline.contains("at risk"));
        assert!(verdict.advice.contains("consult a healthcare provider"));
    }

    #[test]
    fn test_low_risk_message() {
        let verdict = RiskVerdict::new(RiskLabel::Low);
        assert!(verdict.headline.contains("unlikely"));
        assert_eq!(verdict.advice, "Keep maintaining a healthy lifestyle!");
    }
}
