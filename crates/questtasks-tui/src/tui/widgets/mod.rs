// TUI widget modules for each screen and panel.

pub mod dialog;
pub mod help_bar;
pub mod leaderboard;
pub mod login;
pub mod mission_form;
pub mod mission_list;
pub mod path_map;
pub mod planner;
pub mod progress;
pub mod quit_confirm;
pub mod status_bar;
pub mod task_list;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// First row to draw so that `selected` stays inside `visible_rows`.
pub fn window_start(selected: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 {
        return selected;
    }
    selected.saturating_sub(visible_rows - 1)
}

/// A labelled input line. The focused field is highlighted and shows a cursor.
pub fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![
        Span::styled(format!("{:>12}: ", label), label_style),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ];
    if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_selection_visible() {
        assert_eq!(window_start(0, 10), 0);
        assert_eq!(window_start(9, 10), 0);
        assert_eq!(window_start(10, 10), 1);
        assert_eq!(window_start(25, 10), 16);
        assert_eq!(window_start(3, 0), 3);
    }

    #[test]
    fn field_line_marks_focus() {
        let focused = field_line("Title", "Dig", true);
        assert_eq!(focused.spans.len(), 3);
        let plain = field_line("Title", "Dig", false);
        assert_eq!(plain.spans.len(), 2);
        assert!(plain.spans[0].content.ends_with("Title: "));
    }
}
