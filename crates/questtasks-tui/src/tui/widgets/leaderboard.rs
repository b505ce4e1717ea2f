// Leaderboard panel: participants ranked by points.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use questtasks_core::mission::progress::Standing;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Leaderboard");
    let standings = state
        .board
        .as_ref()
        .map(|b| b.standings.as_slice())
        .unwrap_or(&[]);

    if standings.is_empty() {
        let paragraph = Paragraph::new("  No participants yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(["#", "Player", "Pts", "Done"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = standings
        .iter()
        .map(|s| {
            let style = if s.player.is_current_user {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new([
                Cell::from(rank_label(s)),
                Cell::from(player_label(s)),
                Cell::from(s.player.total_points.to_string()),
                Cell::from(format!("{}%", s.completion_pct)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(8),
        Constraint::Length(5),
        Constraint::Length(5),
    ];
    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

/// Medal for the podium, plain rank below it.
pub fn rank_label(standing: &Standing) -> String {
    standing
        .medal()
        .map(str::to_string)
        .unwrap_or_else(|| standing.rank.to_string())
}

pub fn player_label(standing: &Standing) -> String {
    let mut label = standing.player.name.clone();
    if standing.leader {
        label.push_str(" 👑");
    }
    if standing.player.is_current_user {
        label.push_str(" (you)");
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::tests::sample_board;
    use questtasks_core::mission::progress::leaderboard;
    use questtasks_core::mission::Player;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn player(name: &str, points: u32) -> Player {
        Player {
            id: name.into(),
            name: name.into(),
            avatar: String::new(),
            total_points: points,
            completed_tasks: 0,
            total_tasks: 4,
            is_current_user: name == "bob",
        }
    }

    #[test]
    fn labels_show_medals_crown_and_self() {
        let players: Vec<Player> = [("ann", 5), ("bob", 30), ("cy", 10), ("dee", 0)]
            .into_iter()
            .map(|(n, p)| player(n, p))
            .collect();
        let standings = leaderboard(&players);
        assert_eq!(rank_label(&standings[0]), "🥇");
        assert_eq!(rank_label(&standings[3]), "4");
        assert_eq!(player_label(&standings[0]), "bob 👑 (you)");
        assert_eq!(player_label(&standings[1]), "cy");
    }

    #[test]
    fn single_player_has_no_crown() {
        let board = sample_board();
        assert_eq!(player_label(&board.standings[0]), "alice (you)");
    }

    #[test]
    fn render_empty_and_filled() {
        let mut state = ViewState::default();
        let backend = TestBackend::new(40, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        state.board = Some(sample_board());
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("alice"));
    }
}
