// Screen layout: panel arrangement and sizing.
//
// Every screen shares the outer frame:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Main area (fill)                                  |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// The mission screen splits its main area further:
//
// +-------------------------+------------------------+
// | Map / task list (65%)    | Progress (9 rows)      |
// |                          +------------------------+
// |                          | Leaderboard (fill)     |
// +-------------------------+------------------------+

use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};

/// Resolved screen areas shared by all screens.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: user, screen title, activity and notices.
    pub status_bar: Rect,
    /// The active screen.
    pub main: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Areas of the mission screen.
#[derive(Debug, Clone)]
pub struct MissionLayout {
    pub board: Rect,
    pub progress: Rect,
    pub leaderboard: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(5),    // main
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        main: vertical[1],
        help_bar: vertical[2],
    }
}

pub fn build_mission_layout(main: Rect) -> MissionLayout {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(main);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(horizontal[1]);

    MissionLayout {
        board: horizontal[0],
        progress: sidebar[0],
        leaderboard: sidebar[1],
    }
}

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the rectangle is clamped to the available space.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
