//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Prediction via background worker

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::ForestClassifier;
use crate::application::PredictionService;
use crate::config::Settings;
use crate::domain::reference_table;
use crate::ports::RiskClassifier;

use super::ui::{
    form::{render_form, PatientFormState},
    render_disclaimer,
    result::{render_result, ResultState},
};
use super::worker::{PredictionProgress, PredictionWorker, PredictionWorkerHandle};

/// A prediction still running after this long is abandoned.
const PREDICTION_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_POLL: Duration = Duration::from_millis(50);

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Result,
}

/// Main application state
pub struct App<C: RiskClassifier = ForestClassifier> {
    screen: Screen,
    should_quit: bool,
    prediction_service: Arc<PredictionService<C>>,
    form_state: PatientFormState,
    result_state: ResultState,
    pending_worker: Option<PredictionWorkerHandle>,
    timeout: Duration,
}

impl App<ForestClassifier> {
    /// Create the application, loading the model named in `settings`.
    ///
    /// # Errors
    /// Returns error if the model artifact cannot be loaded or verified.
    pub fn new(settings: &Settings) -> Result<Self> {
        let model_path = &settings.model_path;

        // Refuse to start without a usable model.
        let classifier = ForestClassifier::load(model_path).with_context(|| {
            format!(
                "Failed to load model from {}. Set {} to the model file or its directory.",
                model_path.display(),
                crate::config::MODEL_PATH_ENV
            )
        })?;

        let service = PredictionService::new(Arc::new(classifier));
        Ok(Self::with_dependencies(Arc::new(service)))
    }
}

impl<C> App<C>
where
    C: RiskClassifier + 'static,
{
    /// Create application with an injected prediction service.
    #[must_use]
    pub fn with_dependencies(prediction_service: Arc<PredictionService<C>>) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            prediction_service,
            form_state: PatientFormState::default(),
            result_state: ResultState::default(),
            pending_worker: None,
            timeout: PREDICTION_TIMEOUT,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal even if the loop failed
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        self.form_state.clear_sensitive();
        result
    }

    fn main_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.poll_worker();
            self.draw(terminal)?;

            if event::poll(EVENT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(3)])
                .split(f.area());

            match self.screen {
                Screen::Form => render_form(f, chunks[0], &self.form_state),
                Screen::Result => render_result(f, chunks[0], &self.result_state),
            }

            render_disclaimer(f, chunks[1]);
        })?;
        Ok(())
    }

    /// Poll the background worker for its outcome.
    fn poll_worker(&mut self) {
        let Some(worker) = self.pending_worker.as_ref() else {
            return;
        };

        match worker.try_recv() {
            Some(PredictionProgress::Complete(assessment)) => {
                let readings = match self.form_state.to_profile() {
                    Ok(profile) => reference_table(&profile),
                    Err(_) => Vec::new(),
                };
                self.result_state = ResultState::Complete {
                    assessment,
                    readings,
                };
                self.pending_worker = None;
            }
            Some(PredictionProgress::Error(message)) => {
                self.result_state = ResultState::Error { message };
                self.pending_worker = None;
            }
            None if worker.elapsed() > self.timeout => {
                tracing::error!(
                    "Prediction abandoned after {} ms",
                    worker.elapsed().as_millis()
                );
                self.result_state = ResultState::Error {
                    message: format!("Prediction did not finish within {:?}", self.timeout),
                };
                self.pending_worker = None;
            }
            None => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left => self.form_state.step(false),
            KeyCode::Right => self.form_state.step(true),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form_state.load_sample_data(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.form_state.clear_sensitive(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match &self.result_state {
            ResultState::Predicting { .. } => {
                if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q')) {
                    self.should_quit = true;
                }
            }
            ResultState::Complete { .. } => match key {
                KeyCode::Esc => self.back_to_form(),
                KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char('N') => {
                    self.form_state.clear_sensitive();
                    self.back_to_form();
                }
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                _ => {}
            },
            ResultState::Error { .. } | ResultState::Idle => match key {
                KeyCode::Enter | KeyCode::Esc => self.back_to_form(),
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn back_to_form(&mut self) {
        self.result_state = ResultState::Idle;
        self.screen = Screen::Form;
    }

    fn submit_form(&mut self) {
        if self.pending_worker.is_some() {
            return;
        }

        match self.form_state.to_profile() {
            Ok(profile) => {
                if let Err(errors) = profile.validate() {
                    self.form_state.error_message = Some(errors.join(", "));
                    return;
                }

                let worker = PredictionWorker::spawn(self.prediction_service.clone(), profile);
                self.result_state = ResultState::Predicting {
                    started_at: worker.started_at(),
                };
                self.pending_worker = Some(worker);
                self.screen = Screen::Result;
            }
            Err(e) => {
                self.form_state.error_message = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PatientProfile, RiskLabel, FEATURE_NAMES};
    use crate::ports::{ModelError, Prediction};
    use crate::tui::ui::buffer_text;
    use ratatui::backend::TestBackend;
    use std::path::Path;
    use std::time::Instant;

    /// Classifier that takes longer than any test timeout.
    struct SlowClassifier {
        names: Vec<String>,
        delay: Duration,
    }

    impl RiskClassifier for SlowClassifier {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, _features: &[f64]) -> Result<Prediction, ModelError> {
            std::thread::sleep(self.delay);
            Ok(Prediction {
                label: 0,
                risk_share: 0.0,
            })
        }
    }

    fn slow_app(delay: Duration) -> App<SlowClassifier> {
        let classifier = SlowClassifier {
            names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            delay,
        };
        App::with_dependencies(Arc::new(PredictionService::new(Arc::new(classifier))))
    }

    fn app() -> App {
        let settings = Settings {
            model_path: Path::new("models").to_path_buf(),
            ..Settings::default()
        };
        App::new(&settings).expect("bundled model should load")
    }

    fn press<C: RiskClassifier + 'static>(app: &mut App<C>, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    fn wait_for_result<C: RiskClassifier + 'static>(app: &mut App<C>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.pending_worker.is_some() {
            assert!(Instant::now() < deadline, "prediction did not finish");
            app.poll_worker();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_missing_model_fails_startup() {
        let settings = Settings {
            model_path: Path::new("does/not/exist.json").to_path_buf(),
            ..Settings::default()
        };
        let err = App::new(&settings).err().expect("should fail");
        assert!(err.to_string().contains("Failed to load model"));
    }

    #[test]
    fn test_submit_sample_shows_low_risk() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Result);
        assert!(matches!(app.result_state, ResultState::Predicting { .. }));

        wait_for_result(&mut app);
        match &app.result_state {
            ResultState::Complete {
                assessment,
                readings,
            } => {
                assert_eq!(assessment.verdict.label, RiskLabel::Low);
                assert_eq!(readings.len(), 6);
            }
            other => panic!("unexpected state: {other:?}"),
        }

        let mut terminal = Terminal::new(TestBackend::new(150, 40)).expect("terminal");
        app.draw(&mut terminal).expect("draw");
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("LOW RISK"));
        assert!(text.contains("DISCLAIMER"));
    }

    #[test]
    fn test_escape_keeps_answers_and_new_clears_them() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        wait_for_result(&mut app);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Form);
        assert_eq!(
            app.form_state.to_profile(),
            Ok(PatientProfile::sample())
        );

        press(&mut app, KeyCode::Enter);
        wait_for_result(&mut app);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen, Screen::Form);
        assert_eq!(
            app.form_state.to_profile(),
            Ok(PatientProfile::default())
        );
    }

    #[test]
    fn test_invalid_form_stays_on_form() {
        let mut app = app();
        // Move to Age and empty it.
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen, Screen::Form);
        assert!(app.pending_worker.is_none());
        assert!(app.form_state.error_message.is_some());
    }

    #[test]
    fn test_stalled_prediction_times_out() {
        let mut app = slow_app(Duration::from_secs(2));
        app.timeout = Duration::from_millis(200);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);

        app.poll_worker();
        assert!(app.pending_worker.is_some(), "still inside the timeout");
        assert!(matches!(app.result_state, ResultState::Predicting { .. }));

        std::thread::sleep(Duration::from_millis(300));
        app.poll_worker();
        assert!(app.pending_worker.is_none());
        match &app.result_state {
            ResultState::Error { message } => {
                assert_eq!(message, "Prediction did not finish within 200ms");
            }
            other => panic!("unexpected state: {other:?}"),
        }

        // Back to the form with the answers intact.
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Form);
        assert_eq!(app.form_state.to_profile(), Ok(PatientProfile::sample()));
    }

    #[test]
    fn test_slow_prediction_within_timeout_completes() {
        let mut app = slow_app(Duration::from_millis(30));
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);

        wait_for_result(&mut app);
        assert!(matches!(app.result_state, ResultState::Complete { .. }));
    }

    #[test]
    fn test_reset_key_restores_defaults() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.form_state.to_profile(), Ok(PatientProfile::default()));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = self::app();
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
