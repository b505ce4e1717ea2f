// Mission screen, list view: tasks in path order with status and due date.

use chrono::{Local, NaiveDateTime};
use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;

use questtasks_core::mission::format_deadline;
use questtasks_core::mission::progress::DueStatus;
use questtasks_core::mission::Task;

use super::window_start;
use crate::tui::{ViewState, TASKS};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(board) = state.board.as_ref() else {
        let paragraph = Paragraph::new("  Loading mission...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Tasks"));
        frame.render_widget(paragraph, area);
        return;
    };

    let title = format!("Tasks ({}/{})", board.summary.completed, board.summary.total);
    let block = Block::default().borders(Borders::ALL).title(title);

    if board.tasks.is_empty() {
        let paragraph = Paragraph::new("  No tasks yet. Press t to add one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let now = Local::now().naive_local();
    let selected = state.selected(TASKS);
    let visible = (area.height as usize).saturating_sub(2);
    let start = window_start(selected, visible.max(1));
    let total = board.tasks.len();

    let items: Vec<ListItem> = board
        .tasks
        .iter()
        .enumerate()
        .skip(start)
        .take(visible.max(1))
        .map(|(i, task)| {
            let style = if i == selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(task_line(i, task, now)).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);

    if total > visible {
        let mut scrollbar_state =
            ScrollbarState::new(total.saturating_sub(visible)).position(start);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

/// One row: checkbox, number, title, points and due label.
pub fn task_line(index: usize, task: &Task, now: NaiveDateTime) -> Line<'static> {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let mut title = task.title.clone();
    if task.is_final {
        title.push_str(" ★");
    }
    if let Some(boss) = task.boss_name.as_deref().filter(|_| task.has_boss()) {
        title.push_str(&format!(" (boss: {boss})"));
    }

    let title_style = if task.completed {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans = vec![
        Span::styled(format!(" {check} "), Style::default().fg(Color::Green)),
        Span::styled(format!("{:>2}. ", index + 1), Style::default().fg(Color::Gray)),
        Span::styled(title, title_style),
        Span::styled(format!("  {} pts", task.points), Style::default().fg(Color::Yellow)),
    ];

    if let Some(status) = DueStatus::of(task, now) {
        let due = match (status, task.deadline.as_ref()) {
            (DueStatus::Done, _) | (_, None) => status.label(),
            (_, Some(deadline)) => format!("{} ({})", status.label(), format_deadline(deadline)),
        };
        spans.push(Span::styled(format!("  {due}"), Style::default().fg(due_color(status))));
    }
    Line::from(spans)
}

pub fn due_color(status: DueStatus) -> Color {
    match status {
        DueStatus::Done => Color::Green,
        DueStatus::Overdue => Color::Red,
        DueStatus::Today => Color::Yellow,
        DueStatus::DaysLeft(_) => Color::Gray,
    }
}
