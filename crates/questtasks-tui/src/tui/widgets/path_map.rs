// Mission screen, map view: the task path drawn on a canvas with checkpoint
// glyphs and player badges.
//
// Path points are percentages with the origin at the top-left; the canvas
// origin is bottom-left, so y is flipped on the way in.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as PathSegment};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use questtasks_core::mission::board::MissionBoard;
use questtasks_core::mission::progress::{CheckpointKind, PathPoint};

use crate::tui::{ViewState, TASKS};

/// Badges shown next to a checkpoint before collapsing into "+N".
const MAX_BADGES: usize = 3;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(board) = state.board.as_ref() else {
        let paragraph = Paragraph::new("  Loading mission...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Map"));
        frame.render_widget(paragraph, area);
        return;
    };

    let title = format!("Map · {}", board.layout.label());
    let block = Block::default().borders(Borders::ALL).title(title);

    if board.path.is_empty() {
        let paragraph = Paragraph::new("  The path is empty. Press t to add the first task.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let selected = state.selected(TASKS);
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, 100.0])
        .y_bounds([0.0, 100.0])
        .paint(|ctx| {
            for pair in board.path.windows(2) {
                let (x1, y1) = to_canvas(pair[0]);
                let (x2, y2) = to_canvas(pair[1]);
                ctx.draw(&PathSegment {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: Color::DarkGray,
                });
            }
            ctx.layer();

            for (i, point) in board.path.iter().enumerate() {
                let (x, y) = to_canvas(*point);
                ctx.print(x, y, checkpoint_span(board, i, i == selected));
                if let Some(badges) = player_badges(board, i) {
                    ctx.print(
                        (x + 3.0).min(100.0),
                        y,
                        Span::styled(badges, Style::default().fg(Color::Magenta)),
                    );
                }
            }
        });
    frame.render_widget(canvas, area);
}

/// Canvas coordinates for a path point.
pub fn to_canvas(point: PathPoint) -> (f64, f64) {
    (point.x, 100.0 - point.y)
}

fn checkpoint_span(board: &MissionBoard, index: usize, selected: bool) -> Line<'static> {
    let kind = board.checkpoints[index];
    let done = board.tasks.get(index).is_some_and(|t| t.completed);
    let color = match kind {
        _ if done => Color::Green,
        CheckpointKind::Final => Color::Yellow,
        CheckpointKind::Boss => Color::Red,
        CheckpointKind::Start => Color::Cyan,
        _ => Color::White,
    };
    let mut style = Style::default().fg(color);
    if selected {
        style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
    }
    Line::from(Span::styled(kind.glyph().to_string(), style))
}

/// Initials of the players on checkpoint `index`, the signed-in user marked
/// with brackets. `None` when nobody stands there.
pub fn player_badges(board: &MissionBoard, index: usize) -> Option<String> {
    let players = board.players_at(index);
    if players.is_empty() {
        return None;
    }
    let mut badges: Vec<String> = players
        .iter()
        .take(MAX_BADGES)
        .map(|p| {
            if p.is_current_user {
                format!("[{}]", p.initials())
            } else {
                p.initials()
            }
        })
        .collect();
    if players.len() > MAX_BADGES {
        badges.push(format!("+{}", players.len() - MAX_BADGES));
    }
    Some(badges.join(" "))
}
