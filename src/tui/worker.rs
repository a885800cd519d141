//! Background prediction worker.
//!
//! Runs the classifier off the UI thread so the event loop keeps drawing
//! while a prediction is in flight.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::application::PredictionService;
use crate::domain::{Assessment, PatientProfile};
use crate::ports::RiskClassifier;

/// Messages from the prediction worker.
#[derive(Debug, Clone)]
pub enum PredictionProgress {
    /// Prediction finished with a verdict
    Complete(Assessment),
    /// Validation or classifier failure
    Error(String),
}

/// Handle to a running prediction.
pub struct PredictionWorkerHandle {
    progress_rx: Receiver<PredictionProgress>,
    started_at: Instant,
    _handle: JoinHandle<()>,
}

impl PredictionWorkerHandle {
    /// Try to receive the outcome (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<PredictionProgress> {
        self.progress_rx.try_recv().ok()
    }

    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Runs one prediction per spawned thread.
pub struct PredictionWorker;

impl PredictionWorker {
    /// Spawn a background prediction for `profile`.
    ///
    /// The profile is moved into the worker and dropped when it finishes.
    pub fn spawn<C>(
        service: Arc<PredictionService<C>>,
        profile: PatientProfile,
    ) -> PredictionWorkerHandle
    where
        C: RiskClassifier + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let started_at = Instant::now();

        let handle = thread::spawn(move || {
            Self::run_prediction(&service, &profile, &tx);
        });

        PredictionWorkerHandle {
            progress_rx: rx,
            started_at,
            _handle: handle,
        }
    }

    fn run_prediction<C>(
        service: &PredictionService<C>,
        profile: &PatientProfile,
        tx: &Sender<PredictionProgress>,
    ) where
        C: RiskClassifier,
    {
        let message = match service.predict(profile) {
            Ok(assessment) => PredictionProgress::Complete(assessment),
            Err(e) => {
                tracing::warn!("Prediction failed: {}", e);
                PredictionProgress::Error(e.to_string())
            }
        };

        // Receiver is gone if the UI gave up waiting.
        let _ = tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ForestClassifier;
    use crate::domain::RiskLabel;
    use std::path::Path;

    fn wait(handle: &PredictionWorkerHandle) -> PredictionProgress {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(progress) = handle.try_recv() {
                return progress;
            }
            assert!(Instant::now() < deadline, "worker did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn service() -> Arc<PredictionService<ForestClassifier>> {
        let classifier = ForestClassifier::load(Path::new("models")).expect("bundled model");
        Arc::new(PredictionService::new(Arc::new(classifier)))
    }

    #[test]
    fn test_worker_reports_verdict() {
        let handle = PredictionWorker::spawn(service(), PatientProfile::sample());
        match wait(&handle) {
            PredictionProgress::Complete(assessment) => {
                assert_eq!(assessment.verdict.label, RiskLabel::Low);
            }
            PredictionProgress::Error(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_worker_reports_validation_error() {
        let profile = PatientProfile {
            age: 5,
            ..PatientProfile::sample()
        };
        let handle = PredictionWorker::spawn(service(), profile);
        match wait(&handle) {
            PredictionProgress::Error(e) => assert!(e.contains("Age 5")),
            PredictionProgress::Complete(_) => panic!("expected validation error"),
        }
    }
}
