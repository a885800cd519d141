//! Health survey input form.
//!
//! Choice fields cycle through a closed option list; numeric fields act as
//! bounded sliders that also accept typed digits.

use std::str::FromStr;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{bounds, Answer, Education, Gender, Metric, MetricReading, PatientProfile};
use crate::tui::styles::MedicalTheme;

use super::metrics::render_metrics;

const GENDER_OPTIONS: [&str; 2] = [Gender::Male.label(), Gender::Female.label()];
const EDUCATION_OPTIONS: [&str; 4] = [
    Education::HighSchool.label(),
    Education::Undergraduate.label(),
    Education::Postgraduate.label(),
    Education::Phd.label(),
];
const YES_NO_OPTIONS: [&str; 2] = [Answer::Yes.label(), Answer::No.label()];

const MAX_INPUT_LEN: usize = 6;

// Field positions, matching the model's feature order.
const GENDER: usize = 0;
const AGE: usize = 1;
const EDUCATION: usize = 2;
const SMOKER: usize = 3;
const CIGS_PER_DAY: usize = 4;
const BP_MEDS: usize = 5;
const STROKE: usize = 6;
const HYPERTENSION: usize = 7;
const DIABETES: usize = 8;
const CHOLESTEROL: usize = 9;
const SYSTOLIC_BP: usize = 10;
const DIASTOLIC_BP: usize = 11;
const BMI: usize = 12;
const HEART_RATE: usize = 13;
const GLUCOSE: usize = 14;

/// Input widget behind a form field.
#[derive(Debug, Clone)]
pub enum FieldInput {
    Choice {
        options: &'static [&'static str],
        selected: usize,
    },
    Number {
        value: String,
        min: f64,
        max: f64,
        step: f64,
        decimals: usize,
    },
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn choice(label: &'static str, hint: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Choice {
                options,
                selected: 0,
            },
        }
    }

    fn integer(label: &'static str, hint: &'static str, range: &std::ops::RangeInclusive<u32>) -> Self {
        Self::number(label, hint, f64::from(*range.start()), f64::from(*range.end()), 1.0, 0)
    }

    fn number(
        label: &'static str,
        hint: &'static str,
        min: f64,
        max: f64,
        step: f64,
        decimals: usize,
    ) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Number {
                value: String::new(),
                min,
                max,
                step,
                decimals,
            },
        }
    }

    /// Text shown in the field box.
    fn display_value(&self) -> String {
        match &self.input {
            FieldInput::Choice { options, selected } => options[*selected].to_string(),
            FieldInput::Number { value, .. } => value.clone(),
        }
    }

    fn number_value(&self) -> Option<f64> {
        match &self.input {
            FieldInput::Number { value, .. } => value.parse().ok(),
            FieldInput::Choice { .. } => None,
        }
    }

    fn choice_label(&self) -> &'static str {
        match &self.input {
            FieldInput::Choice { options, selected } => options[*selected],
            FieldInput::Number { .. } => "",
        }
    }

    fn set_choice(&mut self, label: &str) {
        if let FieldInput::Choice { options, selected } = &mut self.input {
            if let Some(idx) = options.iter().position(|o| *o == label) {
                *selected = idx;
            }
        }
    }

    fn set_number(&mut self, v: f64) {
        if let FieldInput::Number {
            value, decimals, ..
        } = &mut self.input
        {
            value.zeroize();
            *value = format!("{v:.prec$}", prec = *decimals);
        }
    }
}

/// Survey form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        let mut state = Self {
            fields: vec![
                FormField::choice("Gender", "Choose your gender", &GENDER_OPTIONS),
                FormField::integer("Age", "years (20-100)", &bounds::AGE_YEARS),
                FormField::choice("Education", "Highest academic qualification", &EDUCATION_OPTIONS),
                FormField::choice("Current smoker", "Do you smoke regularly?", &YES_NO_OPTIONS),
                FormField::integer("Cigarettes/day", "0-50", &bounds::CIGS_PER_DAY),
                FormField::choice("BP medication", "Taking blood pressure medication?", &YES_NO_OPTIONS),
                FormField::choice("Prior stroke", "Ever had a stroke?", &YES_NO_OPTIONS),
                FormField::choice("Hypertension", "High blood pressure?", &YES_NO_OPTIONS),
                FormField::choice("Diabetes", "Diagnosed with diabetes?", &YES_NO_OPTIONS),
                FormField::integer("Cholesterol", "mg/dL (100-400)", &bounds::TOTAL_CHOLESTEROL),
                FormField::integer("Systolic BP", "mm Hg (90-200)", &bounds::SYSTOLIC_BP),
                FormField::integer("Diastolic BP", "mm Hg (60-130)", &bounds::DIASTOLIC_BP),
                FormField::number(
                    "BMI",
                    "10.0-50.0",
                    *bounds::BMI.start(),
                    *bounds::BMI.end(),
                    0.1,
                    1,
                ),
                FormField::integer("Heart rate", "bpm (40-150)", &bounds::HEART_RATE),
                FormField::integer("Glucose", "mg/dL (60-300)", &bounds::GLUCOSE),
            ],
            selected_field: 0,
            error_message: None,
        };
        state.load_profile(&PatientProfile::default());
        state
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Type a character into the current numeric field
    pub fn input_char(&mut self, c: char) {
        if let FieldInput::Number {
            value, decimals, ..
        } = &mut self.fields[self.selected_field].input
        {
            let accepted = c.is_ascii_digit() || (c == '.' && *decimals > 0 && !value.contains('.'));
            if accepted && value.len() < MAX_INPUT_LEN {
                value.push(c);
                self.error_message = None;
            }
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FieldInput::Number { value, .. } = &mut self.fields[self.selected_field].input {
            value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        if let FieldInput::Number { value, .. } = &mut self.fields[self.selected_field].input {
            value.zeroize();
        }
    }

    /// Move the current field one notch: next option, or one slider step.
    pub fn step(&mut self, forward: bool) {
        let field = &mut self.fields[self.selected_field];
        let stepped = match &mut field.input {
            FieldInput::Choice { options, selected } => {
                let n = options.len();
                *selected = if forward {
                    (*selected + 1) % n
                } else {
                    (*selected + n - 1) % n
                };
                None
            }
            FieldInput::Number {
                value,
                min,
                max,
                step,
                ..
            } => {
                let current = value.parse::<f64>().unwrap_or(*min);
                let next = if forward { current + *step } else { current - *step };
                Some(next.clamp(*min, *max))
            }
        };
        if let Some(v) = stepped {
            field.set_number(v);
        }
        self.error_message = None;
    }

    /// Wipe all field buffers and return to the untouched form.
    ///
    /// Used by reset, by starting a new assessment and on exit.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            if let FieldInput::Number { value, .. } = &mut field.input {
                value.zeroize();
            }
        }
        self.load_profile(&PatientProfile::default());
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Fill every field from a profile.
    pub fn load_profile(&mut self, profile: &PatientProfile) {
        self.fields[GENDER].set_choice(profile.gender.label());
        self.fields[AGE].set_number(f64::from(profile.age));
        self.fields[EDUCATION].set_choice(profile.education.label());
        self.fields[SMOKER].set_choice(profile.current_smoker.label());
        self.fields[CIGS_PER_DAY].set_number(f64::from(profile.cigs_per_day));
        self.fields[BP_MEDS].set_choice(profile.bp_meds.label());
        self.fields[STROKE].set_choice(profile.prevalent_stroke.label());
        self.fields[HYPERTENSION].set_choice(profile.prevalent_hyp.label());
        self.fields[DIABETES].set_choice(profile.diabetes.label());
        self.fields[CHOLESTEROL].set_number(f64::from(profile.tot_chol));
        self.fields[SYSTOLIC_BP].set_number(f64::from(profile.sys_bp));
        self.fields[DIASTOLIC_BP].set_number(f64::from(profile.dia_bp));
        self.fields[BMI].set_number(profile.bmi);
        self.fields[HEART_RATE].set_number(f64::from(profile.heart_rate));
        self.fields[GLUCOSE].set_number(f64::from(profile.glucose));
        self.error_message = None;
    }

    /// Load the sample profile
    pub fn load_sample_data(&mut self) {
        self.load_profile(&PatientProfile::sample());
    }

    fn number(&self, idx: usize) -> Result<f64, String> {
        let field = &self.fields[idx];
        let FieldInput::Number {
            value,
            min,
            max,
            decimals,
            ..
        } = &field.input
        else {
            return Err(format!("{}: Not a numeric field", field.label));
        };

        let parsed: f64 = value
            .parse()
            .map_err(|_| format!("{}: Invalid number", field.label))?;
        if parsed < *min || parsed > *max {
            return Err(format!(
                "{}: Value must be between {} and {}",
                field.label, min, max
            ));
        }
        if *decimals == 0 && parsed.fract() != 0.0 {
            return Err(format!("{}: Must be a whole number", field.label));
        }
        Ok(parsed)
    }

    fn choice<T>(&self, idx: usize) -> Result<T, String>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.fields[idx]
            .choice_label()
            .parse()
            .map_err(|e: T::Err| e.to_string())
    }

    fn whole(&self, idx: usize) -> Result<u32, String> {
        // Range-checked and integral by `number`.
        self.number(idx).map(|v| v as u32)
    }

    /// Validate and convert to a PatientProfile
    pub fn to_profile(&self) -> Result<PatientProfile, String> {
        Ok(PatientProfile {
            gender: self.choice(GENDER)?,
            age: self.whole(AGE)?,
            education: self.choice(EDUCATION)?,
            current_smoker: self.choice(SMOKER)?,
            cigs_per_day: self.whole(CIGS_PER_DAY)?,
            bp_meds: self.choice(BP_MEDS)?,
            prevalent_stroke: self.choice(STROKE)?,
            prevalent_hyp: self.choice(HYPERTENSION)?,
            diabetes: self.choice(DIABETES)?,
            tot_chol: self.whole(CHOLESTEROL)?,
            sys_bp: self.whole(SYSTOLIC_BP)?,
            dia_bp: self.whole(DIASTOLIC_BP)?,
            bmi: self.number(BMI)?,
            heart_rate: self.whole(HEART_RATE)?,
            glucose: self.whole(GLUCOSE)?,
        })
    }

    /// Reference readings for every metric field that currently parses.
    #[must_use]
    pub fn readings(&self) -> Vec<MetricReading> {
        Metric::ALL
            .iter()
            .filter_map(|&metric| {
                self.fields[metric_field(metric)]
                    .number_value()
                    .map(|value| MetricReading::new(metric, value))
            })
            .collect()
    }
}

fn metric_field(metric: Metric) -> usize {
    match metric {
        Metric::Cholesterol => CHOLESTEROL,
        Metric::SystolicBp => SYSTOLIC_BP,
        Metric::DiastolicBp => DIASTOLIC_BP,
        Metric::Bmi => BMI,
        Metric::HeartRate => HEART_RATE,
        Metric::Glucose => GLUCOSE,
    }
}

/// Render the survey form with the live metrics panel beside it
pub fn render_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form + metrics
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    super::render_header(
        f,
        chunks[0],
        "10 Year Heart Disease Prediction",
        "Framingham survey features",
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(chunks[1]);

    render_form_fields(f, body[0], state);
    render_metrics(f, body[1], &state.readings());
    render_form_footer(f, chunks[2], state);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let shown = field.display_value();
        let mut spans = vec![Span::raw(" ")];
        match (&field.input, is_selected) {
            (FieldInput::Choice { .. }, true) => {
                spans.push(Span::styled("◀ ", MedicalTheme::cursor()));
                spans.push(Span::styled(shown, MedicalTheme::text()));
                spans.push(Span::styled(" ▶", MedicalTheme::cursor()));
            }
            (FieldInput::Number { .. }, _) if shown.is_empty() => {
                spans.push(Span::styled(field.hint, MedicalTheme::text_muted()));
            }
            _ => spans.push(Span::styled(shown, MedicalTheme::text())),
        }
        if is_selected {
            if let FieldInput::Number { .. } = field.input {
                spans.push(Span::styled("▌", MedicalTheme::cursor()));
            }
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Adjust ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample ", MedicalTheme::key_desc()),
            Span::styled("[R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeverityTier;
    use crate::tui::ui::buffer_text;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_default_form_is_a_valid_profile() {
        let state = PatientFormState::default();
        assert_eq!(state.fields.len(), 15);
        assert_eq!(state.to_profile(), Ok(PatientProfile::default()));
    }

    #[test]
    fn test_sample_round_trips_through_form() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        assert_eq!(state.to_profile(), Ok(PatientProfile::sample()));
        assert_eq!(state.fields[BMI].display_value(), "22.0");
    }

    #[test]
    fn test_choice_cycles_both_ways() {
        let mut state = PatientFormState::default();
        state.selected_field = EDUCATION;
        state.step(false);
        assert_eq!(state.fields[EDUCATION].choice_label(), "PhD");
        state.step(true);
        state.step(true);
        assert_eq!(state.fields[EDUCATION].choice_label(), "Undergraduate degree");
    }

    #[test]
    fn test_slider_steps_and_clamps() {
        let mut state = PatientFormState::default();
        state.selected_field = AGE;
        state.step(false);
        assert_eq!(state.fields[AGE].display_value(), "20");
        state.step(true);
        assert_eq!(state.fields[AGE].display_value(), "21");

        state.selected_field = BMI;
        state.step(true);
        assert_eq!(state.fields[BMI].display_value(), "10.1");
    }

    #[test]
    fn test_typing_replaces_numeric_value() {
        let mut state = PatientFormState::default();
        state.selected_field = CHOLESTEROL;
        state.clear_field();
        for c in "25x0".chars() {
            state.input_char(c);
        }
        assert_eq!(state.fields[CHOLESTEROL].display_value(), "250");

        // Integer fields refuse a decimal point.
        state.input_char('.');
        assert_eq!(state.fields[CHOLESTEROL].display_value(), "250");
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let mut state = PatientFormState::default();
        state.selected_field = AGE;
        state.clear_field();
        state.input_char('9');
        let err = state.to_profile().expect_err("Should reject");
        assert!(err.starts_with("Age"));
    }

    #[test]
    fn test_empty_field_is_rejected() {
        let mut state = PatientFormState::default();
        state.selected_field = GLUCOSE;
        state.clear_field();
        assert_eq!(state.to_profile(), Err("Glucose: Invalid number".to_string()));
    }

    #[test]
    fn test_clear_sensitive_resets_form() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.selected_field = 7;
        state.clear_sensitive();
        assert_eq!(state.selected_field, 0);
        assert_eq!(state.to_profile(), Ok(PatientProfile::default()));
    }

    #[test]
    fn test_readings_follow_fields() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.selected_field = CHOLESTEROL;
        state.clear_field();
        for c in "210".chars() {
            state.input_char(c);
        }

        let readings = state.readings();
        assert_eq!(readings.len(), 6);
        assert_eq!(readings[0].metric, Metric::Cholesterol);
        assert_eq!(readings[0].tier, SeverityTier::Borderline);

        state.clear_field();
        assert_eq!(state.readings().len(), 5);
    }

    #[test]
    fn test_render_form_shows_fields_and_metrics() {
        let mut state = PatientFormState::default();
        state.load_sample_data();

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).expect("terminal");
        terminal
            .draw(|f| render_form(f, f.area(), &state))
            .expect("draw");

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("10 Year Heart Disease Prediction"));
        assert!(text.contains("Undergraduate degree"));
        assert!(text.contains("Glucose"));
        assert!(text.contains("Healthy Ranges"));
    }
}
