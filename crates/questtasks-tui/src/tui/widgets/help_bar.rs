// Help bar widget: key hints for the active screen or dialog.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::Screen;
use crate::tui::forms::Overlay;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let spans: Vec<Span> = hints(state)
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow)),
                Span::styled(format!(":{action} "), Style::default().fg(Color::Gray)),
            ]
        })
        .collect();
    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// (key, action) pairs for the current mode.
pub fn hints(state: &ViewState) -> &'static [(&'static str, &'static str)] {
    if state.confirm_quit {
        return &[("y", "quit"), ("n", "stay")];
    }
    match &state.overlay {
        Some(Overlay::AddTask(_)) => {
            return &[
                ("Tab", "next field"),
                ("←/→", "boss"),
                ("Space", "final"),
                ("Enter", "add"),
                ("Esc", "cancel"),
            ]
        }
        Some(_) => return &[("Enter", "submit"), ("Esc", "cancel")],
        None => {}
    }
    match state.screen {
        Screen::Login => &[
            ("Tab", "next field"),
            ("Enter", "submit"),
            ("Ctrl+R", "sign in / register"),
            ("Esc", "quit"),
        ],
        Screen::Home => &[
            ("↑/↓", "select"),
            ("Enter", "open"),
            ("n", "new mission"),
            ("a", "AI planner"),
            ("r", "refresh"),
            ("o", "sign out"),
            ("q", "quit"),
        ],
        Screen::Mission => &[
            ("↑/↓", "select"),
            ("Space", "done"),
            ("x", "remove"),
            ("t", "add task"),
            ("i", "invite"),
            ("v", "map/list"),
            ("l", "layout"),
            ("r", "refresh"),
            ("Esc", "back"),
        ],
        Screen::NewMission => &[
            ("Tab", "next field"),
            ("Enter", "add step"),
            ("Ctrl+O", "import CSV"),
            ("Ctrl+S", "save"),
            ("Esc", "back"),
        ],
        Screen::Planner if state.planner.form.is_some() => &[
            ("Tab", "next field"),
            ("Enter", "add step"),
            ("Ctrl+S", "save"),
            ("Esc", "discard"),
        ],
        Screen::Planner => &[("Enter", "generate"), ("Esc", "back")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::forms::MissionForm;

    #[test]
    fn hints_follow_mode() {
        let mut state = ViewState::default();
        assert_eq!(hints(&state)[0], ("Tab", "next field"));

        state.screen = Screen::Home;
        assert!(hints(&state).contains(&("n", "new mission")));

        state.overlay = Some(Overlay::Invite {
            user_id: String::new(),
        });
        assert_eq!(hints(&state), &[("Enter", "submit"), ("Esc", "cancel")]);

        state.confirm_quit = true;
        assert_eq!(hints(&state)[0], ("y", "quit"));
    }

    #[test]
    fn planner_hints_change_once_plan_arrives() {
        let mut state = ViewState::default();
        state.screen = Screen::Planner;
        assert_eq!(hints(&state)[0], ("Enter", "generate"));
        state.planner.form = Some(MissionForm::new(10));
        assert!(hints(&state).contains(&("Ctrl+S", "save")));
    }
}
