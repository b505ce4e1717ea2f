// Mission progress panel: completion gauge plus due and points counters.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

use questtasks_core::mission::progress::ProgressSummary;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Progress");
    let Some(board) = state.board.as_ref() else {
        frame.render_widget(block, area);
        return;
    };
    let summary = &board.summary;

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(inner);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(gauge_color(summary)).bg(Color::Black))
        .ratio(ratio(summary))
        .label(format!(
            "{}/{} tasks ({:.0}%)",
            summary.completed, summary.total, summary.percentage
        ));
    frame.render_widget(gauge, rows[0]);
    frame.render_widget(Paragraph::new(detail_lines(summary)), rows[1]);
}

/// Gauge fill in 0.0..=1.0.
pub fn ratio(summary: &ProgressSummary) -> f64 {
    (summary.percentage / 100.0).clamp(0.0, 1.0)
}

fn gauge_color(summary: &ProgressSummary) -> Color {
    if summary.is_complete() {
        Color::Green
    } else if summary.overdue > 0 {
        Color::Red
    } else {
        Color::Cyan
    }
}

pub fn detail_lines(summary: &ProgressSummary) -> Vec<Line<'static>> {
    let count = |label: &str, n: usize, color: Color| {
        let style = if n > 0 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Line::from(vec![
            Span::styled(format!(" {label:<12}"), Style::default().fg(Color::Gray)),
            Span::styled(n.to_string(), style),
        ])
    };

    let mut lines = vec![
        count("Overdue", summary.overdue, Color::Red),
        count("Due today", summary.due_today, Color::Yellow),
        Line::from(vec![
            Span::styled(format!(" {:<12}", "Finals"), Style::default().fg(Color::Gray)),
            Span::raw(format!("{}/{}", summary.finals_completed, summary.finals)),
        ]),
        Line::from(vec![
            Span::styled(format!(" {:<12}", "Points"), Style::default().fg(Color::Gray)),
            Span::styled(
                summary.points_earned.to_string(),
                Style::default().fg(Color::Yellow),
            ),
        ]),
    ];
    if summary.is_complete() {
        lines.push(Line::from(Span::styled(
            " Mission complete!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    }
    lines
}
