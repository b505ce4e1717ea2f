// Mission authoring form: name and description, the step editor, and the
// steps accepted so far.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use questtasks_core::mission::authoring::StepDraft;
use questtasks_core::mission::format_deadline;

use super::{field_line, window_start};
use crate::tui::forms::{FormFocus, MissionForm, StepField};

pub fn render(frame: &mut Frame, area: Rect, form: &MissionForm, title: &str) {
    let [header, editor, steps] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(StepField::ORDER.len() as u16 + 3),
        Constraint::Min(3),
    ])
    .areas(area);

    let header_lines = vec![
        field_line("Name", &form.draft.name, form.focus == FormFocus::Name),
        field_line(
            "Description",
            &form.draft.description,
            form.focus == FormFocus::Description,
        ),
    ];
    frame.render_widget(
        Paragraph::new(header_lines).block(Block::default().borders(Borders::ALL).title(title.to_string())),
        header,
    );

    let editor_title = match form.editing {
        Some(i) => format!("Editing step {}", i + 1),
        None => "New step".to_string(),
    };
    let mut editor_lines: Vec<Line> = StepField::ORDER
        .iter()
        .map(|f| field_line(f.label(), &form.editor.value(*f), form.focus == FormFocus::Step(*f)))
        .collect();
    editor_lines.push(match &form.error {
        Some(err) => Line::from(Span::styled(format!(" {err}"), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            " Enter adds the step. Deadline format: YYYY-MM-DD HH:MM",
            Style::default().fg(Color::DarkGray),
        )),
    });
    frame.render_widget(
        Paragraph::new(editor_lines).block(Block::default().borders(Borders::ALL).title(editor_title)),
        editor,
    );

    render_steps(frame, steps, form);
}

fn render_steps(frame: &mut Frame, area: Rect, form: &MissionForm) {
    let focused = form.focus == FormFocus::Steps;
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let all = form.draft.steps();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!("Steps ({})", all.len()));

    if all.is_empty() {
        let paragraph = Paragraph::new("  No steps yet. The last step becomes the final one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let visible = (area.height as usize).saturating_sub(2).max(1);
    let start = window_start(form.selected_step, visible);
    let items: Vec<ListItem> = all
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, step)| {
            let style = if focused && i == form.selected_step {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(step_summary(i, step, i + 1 == all.len())).style(style)
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

/// One-line summary of an accepted step.
pub fn step_summary(index: usize, step: &StepDraft, last: bool) -> String {
    let mut line = format!(" {:>2}. {} ({} pts)", index + 1, step.title, step.points);
    if let Some(deadline) = step.deadline.as_ref() {
        line.push_str(&format!(" due {}", format_deadline(deadline)));
    }
    if !step.boss_type.is_none() {
        line.push_str(&format!(" boss {}", step.boss_type));
    }
    if last {
        line.push_str(" ★ final");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use questtasks_core::mission::BossType;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn step(title: &str) -> StepDraft {
        StepDraft {
            title: title.into(),
            points: 15,
            deadline: NaiveDate::from_ymd_opt(2025, 7, 1).and_then(|d| d.and_hms_opt(9, 30, 0)),
            ..StepDraft::blank(10)
        }
    }

    #[test]
    fn summary_lists_details() {
        let mut s = step("Dig");
        s.deadline = None;
        assert_eq!(step_summary(0, &s, false), "  1. Dig (15 pts)");
        s = step("Dig");
        s.boss_type = BossType::Fish2;
        assert_eq!(
            step_summary(1, &s, true),
            "  2. Dig (15 pts) due 2025-07-01 09:30 boss fish-2 ★ final"
        );
    }

    #[test]
    fn render_with_steps_and_error() {
        let mut form = MissionForm::new(10);
        form.draft.name = "Garden".into();
        form.draft.add_step(step("Dig")).unwrap();
        form.draft.add_step(step("Plant")).unwrap();
        form.focus = FormFocus::Steps;
        form.selected_step = 1;
        form.error = Some("Points must be a whole number".into());

        let backend = TestBackend::new(90, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &form, "New mission"))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Garden"));
        assert!(text.contains("Plant"));
        assert!(text.contains("Points must be a whole number"));
    }

    #[test]
    fn render_small_area() {
        let form = MissionForm::new(10);
        let backend = TestBackend::new(30, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &form, "New mission"))
            .unwrap();
    }
}
