//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `forest`: JSON random forest artifact behind `RiskClassifier`
//! - `sanitize`: health-reading filtering for logs

pub mod forest;
pub mod sanitize;

pub use forest::ForestClassifier;
