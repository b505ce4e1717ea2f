// Status bar widget: signed-in user, screen title, activity and the latest
// notice.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::{Notice, NoticeLevel, Screen};
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [user] | [screen] [busy marker] | [notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let user = state
        .user
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or("signed out");
    spans.push(Span::styled(
        format!(" {} ", user),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        screen_title(state),
        Style::default().fg(Color::White),
    ));

    if state.busy {
        spans.push(Span::styled(" [working...]", Style::default().fg(Color::Yellow)));
    }

    if let Some(notice) = &state.notice {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            notice.text.clone(),
            Style::default().fg(notice_color(notice)),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Screen title, naming the open mission on the mission screen.
pub fn screen_title(state: &ViewState) -> String {
    match (&state.screen, &state.board) {
        (Screen::Mission, Some(board)) => {
            format!("Mission: {}", board.mission.name)
        }
        (screen, _) => screen.title().to_string(),
    }
}

pub fn notice_color(notice: &Notice) -> Color {
    match notice.level {
        NoticeLevel::Info => Color::White,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Error => Color::Red,
    }
}
