// AI planner screen: a goal prompt, then the suggested mission in the
// authoring form for review.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::mission_form;
use crate::tui::forms::PlannerForm;

pub fn render(frame: &mut Frame, area: Rect, planner: &PlannerForm) {
    if let Some(form) = planner.form.as_ref() {
        mission_form::render(frame, area, form, "Suggested mission");
        return;
    }

    let [prompt_area, status_area] =
        Layout::vertical([Constraint::Min(5), Constraint::Length(3)]).areas(area);

    let prompt_style = if planner.generating {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let mut text = planner.prompt.clone();
    if !planner.generating {
        text.push('_');
    }
    let prompt = Paragraph::new(Span::styled(text, prompt_style))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Describe your goal and the planner will draft the steps"),
        );
    frame.render_widget(prompt, prompt_area);

    frame.render_widget(
        Paragraph::new(status_line(planner)).block(Block::default().borders(Borders::ALL)),
        status_area,
    );
}

pub fn status_line(planner: &PlannerForm) -> Line<'static> {
    if planner.generating {
        Line::from(Span::styled(
            " Generating a plan...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else if let Some(err) = planner.error.as_ref() {
        Line::from(Span::styled(format!(" {err}"), Style::default().fg(Color::Red)))
    } else {
        Line::from(Span::styled(
            format!(" {} characters. Press Enter to generate.", planner.prompt.chars().count()),
            Style::default().fg(Color::DarkGray),
        ))
    }
}
