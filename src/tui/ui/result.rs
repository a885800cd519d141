//! Prediction result screen.

use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Assessment, MetricReading};
use crate::tui::styles::MedicalTheme;

use super::metrics::render_metrics;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAME_MS: u128 = 80;

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    #[default]
    Idle,
    Predicting {
        started_at: Instant,
    },
    Complete {
        assessment: Assessment,
        readings: Vec<MetricReading>,
    },
    Error {
        message: String,
    },
}

fn spinner_frame(started_at: Instant) -> &'static str {
    let idx = (started_at.elapsed().as_millis() / SPINNER_FRAME_MS) as usize;
    SPINNER_FRAMES[idx % SPINNER_FRAMES.len()]
}

/// Render the result screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    super::render_header(f, chunks[0], "Prediction", "10-year heart disease risk");

    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Predicting { started_at } => render_predicting(f, chunks[1], *started_at),
        ResultState::Complete {
            assessment,
            readings,
        } => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);
            render_assessment(f, body[0], assessment);
            render_metrics(f, body[1], readings);
        }
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }

    render_result_footer(f, chunks[2], state);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No prediction yet. Fill in the form and press Enter.",
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_predicting(f: &mut Frame, area: Rect, started_at: Instant) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(spinner_frame(started_at), MedicalTheme::focused()),
            Span::styled(" Predicting...", MedicalTheme::text()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} ms", started_at.elapsed().as_millis()),
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let label = assessment.verdict.label;
    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Verdict
            Constraint::Length(3), // Vote share
            Constraint::Length(2), // Timing
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(label.to_string(), MedicalTheme::verdict(label))),
        Line::from(""),
        Line::from(Span::styled(assessment.verdict.headline, MedicalTheme::text())),
        Line::from(Span::styled(
            assessment.verdict.advice,
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(verdict, chunks[0]);

    let share = assessment.risk_share.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    " Trees voting high risk ",
                    MedicalTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::verdict(label))
        .ratio(share)
        .label(format!("{:.0}%", share * 100.0));
    f.render_widget(gauge, chunks[1]);

    let timing = Paragraph::new(Line::from(vec![
        Span::styled("Computed in ", MedicalTheme::text_muted()),
        Span::styled(
            format!("{} µs", assessment.latency.as_micros()),
            MedicalTheme::info(),
        ),
        Span::styled(
            format!(" at {}", assessment.assessed_at.format("%Y-%m-%d %H:%M:%S UTC")),
            MedicalTheme::text_muted(),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(timing, chunks[2]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Predicting { .. } => Line::from(vec![Span::styled(
            "Processing...",
            MedicalTheme::text_muted(),
        )]),
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter/Esc] ", MedicalTheme::key_hint()),
            Span::styled("Back to form ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Edit answers ", MedicalTheme::key_desc()),
            Span::styled("[Enter/N] ", MedicalTheme::key_hint()),
            Span::styled("New assessment ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
