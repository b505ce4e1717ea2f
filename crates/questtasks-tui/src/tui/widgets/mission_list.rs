// Home screen: the signed-in user's missions.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use questtasks_core::mission::MissionSummary;

use super::window_start;
use crate::tui::{ViewState, MISSIONS};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let title = format!("My missions ({})", state.missions.len());
    let block = Block::default().borders(Borders::ALL).title(title);

    if state.missions.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::raw("  No missions yet."),
            Line::raw("  Press n to create one, or a to let the AI planner draft it."),
        ])
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let selected = state.selected(MISSIONS);
    let user_id = state.user.as_ref().map(|u| u.id.as_str());
    // Two rows per mission, minus borders.
    let visible = (area.height as usize).saturating_sub(2) / 2;
    let start = window_start(selected, visible.max(1));

    let items: Vec<ListItem> = state
        .missions
        .iter()
        .enumerate()
        .skip(start)
        .take(visible.max(1))
        .map(|(i, m)| mission_item(m, i == selected, user_id))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn mission_item(mission: &MissionSummary, selected: bool, user_id: Option<&str>) -> ListItem<'static> {
    let name_style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    };
    let mut header = vec![Span::styled(format!(" {} ", mission.name), name_style)];
    if Some(mission.created_by_id.as_str()) == user_id {
        header.push(Span::styled(" (yours)", Style::default().fg(Color::Green)));
    }
    ListItem::new(vec![
        Line::from(header),
        Line::from(Span::styled(
            format!("   {}", description_preview(mission, 70)),
            Style::default().fg(Color::Gray),
        )),
    ])
}

/// First `max` characters of the description, with an ellipsis when cut.
pub fn description_preview(mission: &MissionSummary, max: usize) -> String {
    let text = mission
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("No description");
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
