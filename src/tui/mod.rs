//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - The health survey form with a live reference ranges panel
//! - The prediction result view

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
pub use worker::{PredictionProgress, PredictionWorker, PredictionWorkerHandle};
