use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::{
    palette::status_of,
    submission::{SubmissionResult, SubmitTrigger},
    util::{format_clock, humanize_seconds, percent},
};

use super::status_color;

/// Summary and per-question breakdown of a submitted session.
pub struct ResultsView<'a> {
    pub result: &'a SubmissionResult,
}

impl Widget for ResultsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let r = self.result;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(7),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        let headline = match r.trigger {
            SubmitTrigger::Manual => Span::styled(
                "Submitted",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            SubmitTrigger::Timeout => Span::styled(
                "Time expired, auto-submitted",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        };

        let total = r.question_count();
        let summary = vec![
            Line::from(vec![headline, Span::raw(format!("  {}", r.title))]),
            Line::default(),
            Line::from(format!(
                "answered {} / {} ({}%)   marked {}   not answered {}",
                r.answered_count,
                total,
                percent(r.answered_count, total),
                r.marked_count,
                r.not_answered_count
            )),
            Line::from(format!(
                "time used {} ({})",
                format_clock(r.elapsed_seconds),
                humanize_seconds(r.elapsed_seconds)
            )),
            Line::from(format!("submitted {}", r.submitted_at.format("%Y-%m-%d %H:%M:%S"))),
        ];
        Paragraph::new(summary)
            .block(Block::default().borders(Borders::ALL).title(" Result "))
            .render(chunks[0], buf);

        let header = Row::new(vec!["Q", "Status", "Answer", "Confidence", "Time"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = r
            .answers
            .iter()
            .enumerate()
            .map(|(idx, a)| {
                let status = status_of(a, false);
                Row::new(vec![
                    Cell::from((idx + 1).to_string()),
                    Cell::from(status.to_string()).style(Style::default().fg(status_color(status))),
                    Cell::from(
                        a.selected_option
                            .map(|o| (o + 1).to_string())
                            .unwrap_or_else(|| "-".into()),
                    ),
                    Cell::from(a.confidence.map(|c| c.to_string()).unwrap_or_default()),
                    Cell::from(format_clock(a.time_spent_seconds)),
                ])
            })
            .collect();

        Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Length(16),
                Constraint::Length(8),
                Constraint::Length(12),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" Questions "))
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            "q / esc / enter to exit",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .render(chunks[2], buf);
    }
}
