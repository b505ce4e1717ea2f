// Mission-screen dialogs: add task, invite participant, import steps.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::field_line;
use crate::tui::forms::{Overlay, StepField, TaskDialog};
use crate::tui::layout::centered_rect;

const DIALOG_WIDTH: u16 = 64;

pub fn render(frame: &mut Frame, area: Rect, overlay: &Overlay) {
    let lines = match overlay {
        Overlay::AddTask(dialog) => task_lines(dialog),
        Overlay::Invite { user_id } => vec![
            Line::raw(""),
            field_line("User id", user_id, true),
            hint(" The user must already have an account."),
        ],
        Overlay::Import { path } => vec![
            Line::raw(""),
            field_line("CSV file", path, true),
            hint(" Columns: title,description,points,deadline,boss_type,boss_name"),
        ],
    };

    let dialog_area = centered_rect(DIALOG_WIDTH, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} ", overlay.title()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(Style::default().bg(Color::Black)),
        dialog_area,
    );
}

fn hint(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(Color::DarkGray)))
}

pub fn task_lines(dialog: &TaskDialog) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = StepField::ORDER
        .iter()
        .map(|f| field_line(f.label(), &dialog.editor.value(*f), dialog.focus == Some(*f)))
        .collect();
    let check = if dialog.is_final { "[x]" } else { "[ ]" };
    lines.push(field_line("Final step", check, dialog.focus.is_none()));
    if let Some(err) = dialog.error.as_ref() {
        lines.push(Line::from(Span::styled(
            format!(" {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    lines
}
