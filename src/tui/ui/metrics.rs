//! Reference ranges panel: a bar per metric colored by tier, plus a table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table},
    Frame,
};

use crate::domain::MetricReading;
use crate::tui::styles::MedicalTheme;

/// Bars are drawn as a percentage of the healthy upper bound, capped here.
const BAR_CEILING: u64 = 200;

fn bar_percent(reading: &MetricReading) -> u64 {
    if reading.range.upper <= 0.0 {
        return 0;
    }
    let pct = (reading.value / reading.range.upper * 100.0).round();
    (pct.max(0.0) as u64).min(BAR_CEILING)
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Render the reference panel for whatever readings are currently known.
pub fn render_metrics(f: &mut Frame, area: Rect, readings: &[MetricReading]) {
    let block = Block::default()
        .title(Span::styled(" Healthy Ranges ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    if readings.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "Enter readings to compare them with healthy ranges",
            MedicalTheme::text_muted(),
        )));
        f.render_widget(empty, inner);
        return;
    }

    let chart_height = (readings.len() * 2) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(chart_height),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let bars: Vec<Bar> = readings
        .iter()
        .map(|r| {
            Bar::default()
                .label(Line::from(r.metric.short_label()))
                .value(bar_percent(r))
                .text_value(format_value(r.value))
                .style(MedicalTheme::tier(r.tier))
                .value_style(MedicalTheme::title().bg(MedicalTheme::tier_color(r.tier)))
        })
        .collect();

    let chart = BarChart::default()
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(1)
        .max(BAR_CEILING);
    f.render_widget(chart, chunks[0]);

    let header = Row::new(vec!["Metric", "Value", "Healthy", "Tier"])
        .style(MedicalTheme::text_secondary());

    let rows: Vec<Row> = readings
        .iter()
        .map(|r| {
            Row::new(vec![
                Line::from(Span::styled(r.metric.label(), MedicalTheme::text())),
                Line::from(Span::styled(format_value(r.value), MedicalTheme::text())),
                Line::from(Span::styled(
                    format!("{}-{}", format_value(r.range.lower), format_value(r.range.upper)),
                    MedicalTheme::text_muted(),
                )),
                Line::from(Span::styled(r.tier.label(), MedicalTheme::tier(r.tier))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header);

    f.render_widget(table, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{reference_table, Metric, PatientProfile};
    use crate::tui::ui::buffer_text;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_bar_percent_relative_to_upper_bound() {
        assert_eq!(bar_percent(&MetricReading::new(Metric::Cholesterol, 100.0)), 50);
        assert_eq!(bar_percent(&MetricReading::new(Metric::Cholesterol, 200.0)), 100);
        assert_eq!(bar_percent(&MetricReading::new(Metric::Glucose, 300.0)), 200);
        assert_eq!(bar_percent(&MetricReading::new(Metric::Bmi, 50.0)), BAR_CEILING);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(190.0), "190");
        assert_eq!(format_value(22.5), "22.5");
    }

    #[test]
    fn test_render_table_rows_and_tiers() {
        let profile = PatientProfile {
            tot_chol: 210,
            glucose: 250,
            ..PatientProfile::sample()
        };
        let readings = reference_table(&profile);

        let mut terminal = Terminal::new(TestBackend::new(70, 26)).expect("terminal");
        terminal
            .draw(|f| render_metrics(f, f.area(), &readings))
            .expect("draw");

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Healthy Ranges"));
        assert!(text.contains("Cholesterol (mg/dL)"));
        assert!(text.contains("borderline"));
        assert!(text.contains("elevated"));
        assert!(text.contains("125-200"));
    }

    #[test]
    fn test_render_empty_panel() {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).expect("terminal");
        terminal
            .draw(|f| render_metrics(f, f.area(), &[]))
            .expect("draw");

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Enter readings"));
    }
}
