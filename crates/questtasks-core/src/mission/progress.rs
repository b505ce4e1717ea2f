// Path and progress computation for a mission.
//
// Tasks sorted by creation time form the path. Each player sits on the
// checkpoint matching their completed-task count; the current user's count
// comes from local completion flags, everyone else's is estimated from their
// point total since the backend does not report per-task completion.

use std::cmp::Ordering;
use std::f64::consts::PI;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::mission::{Player, Task};

/// Points a non-current player needs per checkpoint on the estimated path.
pub const POINTS_PER_CHECKPOINT: u32 = 20;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Shape of the generated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathLayout {
    /// Bottom-left to top-right along fixed waypoints.
    #[default]
    Winding,
    /// 270 degree arc around the centre.
    Arc,
    /// Bottom to top, zig-zagging across three columns.
    Vertical,
}

impl PathLayout {
    pub fn label(&self) -> &'static str {
        match self {
            PathLayout::Winding => "winding",
            PathLayout::Arc => "arc",
            PathLayout::Vertical => "vertical",
        }
    }

    pub fn next(self) -> PathLayout {
        match self {
            PathLayout::Winding => PathLayout::Arc,
            PathLayout::Arc => PathLayout::Vertical,
            PathLayout::Vertical => PathLayout::Winding,
        }
    }
}

/// A checkpoint location in percent of the map area, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl PathPoint {
    const fn new(x: f64, y: f64) -> Self {
        PathPoint { x, y }
    }
}

const CENTRE: PathPoint = PathPoint::new(50.0, 50.0);
const ARC_RADIUS: f64 = 35.0;

const WINDING_WAYPOINTS: [PathPoint; 7] = [
    PathPoint::new(15.0, 75.0),
    PathPoint::new(25.0, 60.0),
    PathPoint::new(40.0, 50.0),
    PathPoint::new(55.0, 35.0),
    PathPoint::new(70.0, 45.0),
    PathPoint::new(80.0, 30.0),
    PathPoint::new(85.0, 20.0),
];

const VERTICAL_BOTTOM: f64 = 90.0;
const VERTICAL_SPAN: f64 = 75.0;
const VERTICAL_COLUMNS: [f64; 3] = [25.0, 50.0, 75.0];

// ---------------------------------------------------------------------------
// Ordering and placement
// ---------------------------------------------------------------------------

/// Return the tasks in path order: stable by `created_at`, tasks without a
/// timestamp after those with one, keeping their relative order.
pub fn sort_by_creation(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted
}

/// Checkpoint index for a player with `completed` tasks done.
///
/// `None` for an empty path, otherwise clamped to the last checkpoint.
pub fn path_position(completed: usize, task_count: usize) -> Option<usize> {
    if task_count == 0 {
        return None;
    }
    Some(completed.min(task_count - 1))
}

/// Estimated completed count for a player known only by points: the number
/// of path indices `i` with `i < total_points / 20`.
pub fn estimated_completed(total_points: u32, task_count: usize) -> usize {
    // i < p / 20  <=>  20 * i < p, so the count is ceil(p / 20).
    let steps = total_points.div_ceil(POINTS_PER_CHECKPOINT) as usize;
    steps.min(task_count)
}

/// Completed-task count used to place `player` on `tasks`.
pub fn completed_for(player: &Player, tasks: &[Task]) -> usize {
    if player.is_current_user {
        tasks.iter().filter(|t| t.completed).count()
    } else {
        estimated_completed(player.total_points, tasks.len())
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Percent coordinates of `n` checkpoints for the given layout.
pub fn path_coordinates(n: usize, layout: PathLayout) -> Vec<PathPoint> {
    match n {
        0 => Vec::new(),
        1 => vec![CENTRE],
        _ => (0..n)
            .map(|i| {
                let progress = i as f64 / (n - 1) as f64;
                match layout {
                    PathLayout::Winding => winding_point(progress),
                    PathLayout::Arc => arc_point(progress),
                    PathLayout::Vertical => vertical_point(i, progress),
                }
            })
            .collect(),
    }
}

fn arc_point(progress: f64) -> PathPoint {
    let angle = progress * PI * 1.5 - PI * 0.25;
    PathPoint::new(
        CENTRE.x + angle.cos() * ARC_RADIUS,
        CENTRE.y + angle.sin() * ARC_RADIUS,
    )
}

fn winding_point(progress: f64) -> PathPoint {
    let last_segment = WINDING_WAYPOINTS.len() - 2;
    let scaled = progress * (WINDING_WAYPOINTS.len() - 1) as f64;
    let segment = (scaled.floor() as usize).min(last_segment);
    let t = scaled - segment as f64;

    let from = WINDING_WAYPOINTS[segment];
    let to = WINDING_WAYPOINTS[segment + 1];
    PathPoint::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}

fn vertical_point(index: usize, progress: f64) -> PathPoint {
    PathPoint::new(
        VERTICAL_COLUMNS[index % VERTICAL_COLUMNS.len()],
        VERTICAL_BOTTOM - progress * VERTICAL_SPAN,
    )
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Decoration drawn at a path node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    Final,
    Start,
    Boss,
    Landmark,
    Flower,
    Bubble,
}

impl CheckpointKind {
    pub fn of(index: usize, task: &Task) -> Self {
        if task.is_final {
            CheckpointKind::Final
        } else if index == 0 {
            CheckpointKind::Start
        } else if task.has_boss() {
            CheckpointKind::Boss
        } else if index % 3 == 0 {
            CheckpointKind::Landmark
        } else if index % 2 == 0 {
            CheckpointKind::Flower
        } else {
            CheckpointKind::Bubble
        }
    }

    /// Single-cell glyph for the map.
    pub fn glyph(&self) -> char {
        match self {
            CheckpointKind::Final => '★',
            CheckpointKind::Start => '◆',
            CheckpointKind::Boss => '☠',
            CheckpointKind::Landmark => '⌂',
            CheckpointKind::Flower => '✿',
            CheckpointKind::Bubble => '○',
        }
    }
}

// ---------------------------------------------------------------------------
// Due status and summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Done,
    Overdue,
    Today,
    DaysLeft(i64),
}

impl DueStatus {
    /// Status of `task` at `now`. `None` for an open task with no deadline.
    pub fn of(task: &Task, now: NaiveDateTime) -> Option<Self> {
        if task.completed {
            return Some(DueStatus::Done);
        }
        let deadline = task.deadline?;
        if deadline < now {
            Some(DueStatus::Overdue)
        } else if deadline.date() == now.date() {
            Some(DueStatus::Today)
        } else {
            Some(DueStatus::DaysLeft(
                (deadline.date() - now.date()).num_days(),
            ))
        }
    }

    pub fn label(&self) -> String {
        match self {
            DueStatus::Done => "done".to_string(),
            DueStatus::Overdue => "overdue".to_string(),
            DueStatus::Today => "today".to_string(),
            DueStatus::DaysLeft(1) => "1 day left".to_string(),
            DueStatus::DaysLeft(n) => format!("{n} days left"),
        }
    }
}

/// Aggregate progress over a mission's tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
    /// Open tasks whose deadline has passed.
    pub overdue: usize,
    /// Open tasks due on today's date, including any already overdue today.
    pub due_today: usize,
    pub finals: usize,
    pub finals_completed: usize,
    pub points_earned: u32,
}

impl ProgressSummary {
    pub fn compute(tasks: &[Task], now: NaiveDateTime) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let percentage = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let open_deadlines = || {
            tasks
                .iter()
                .filter(|t| !t.completed)
                .filter_map(|t| t.deadline)
        };
        let overdue = open_deadlines().filter(|d| *d < now).count();
        let due_today = open_deadlines()
            .filter(|d| d.date() == now.date())
            .count();

        let finals = tasks.iter().filter(|t| t.is_final).count();
        let finals_completed = tasks.iter().filter(|t| t.is_final && t.completed).count();
        let points_earned = tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.points)
            .sum();

        ProgressSummary {
            completed,
            total,
            percentage,
            overdue,
            due_today,
            finals,
            finals_completed,
            points_earned,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// A ranked player row.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub rank: usize,
    pub player: Player,
    pub completion_pct: u32,
    pub leader: bool,
}

impl Standing {
    pub fn medal(&self) -> Option<&'static str> {
        match self.rank {
            1 => Some("🥇"),
            2 => Some("🥈"),
            3 => Some("🥉"),
            _ => None,
        }
    }
}

/// Rounded completion percentage, 0 when the player has no tasks.
pub fn completion_pct(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

/// Players ordered by points, highest first; ties keep input order. The
/// leader crown goes to the first row only when more than one player exists.
pub fn leaderboard(players: &[Player]) -> Vec<Standing> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    let crowned = sorted.len() > 1;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, p)| Standing {
            rank: i + 1,
            player: p.clone(),
            completion_pct: completion_pct(p.completed_tasks, p.total_tasks),
            leader: crowned && i == 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::BossType;
    use chrono::{DateTime, NaiveDate, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn task(id: &str, points: u32) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: None,
            points,
            deadline: None,
            completed: false,
            is_final: false,
            created_at: None,
            boss_type: BossType::None,
            boss_name: None,
        }
    }

    fn stamped(id: &str, millis: i64) -> Task {
        let mut t = task(id, 10);
        t.created_at = DateTime::<Utc>::from_timestamp_millis(millis);
        t
    }

    fn player(id: &str, points: u32, current: bool) -> Player {
        Player {
            id: id.into(),
            name: id.into(),
            avatar: String::new(),
            total_points: points,
            completed_tasks: 0,
            total_tasks: 0,
            is_current_user: current,
        }
    }

    fn close(a: PathPoint, x: f64, y: f64) -> bool {
        (a.x - x).abs() < 1e-9 && (a.y - y).abs() < 1e-9
    }

    // -- ordering --

    #[test]
    fn sort_by_creation_orders_by_timestamp() {
        let tasks = vec![stamped("c", 3000), stamped("a", 1000), stamped("b", 2000)];
        let ids: Vec<_> = sort_by_creation(&tasks).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn sort_by_creation_is_stable_and_puts_unstamped_last() {
        let tasks = vec![
            task("x", 10),
            stamped("b", 2000),
            task("y", 10),
            stamped("a", 2000),
        ];
        let ids: Vec<_> = sort_by_creation(&tasks).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b", "a", "x", "y"]);
    }

    // -- placement --

    #[test]
    fn path_position_empty_path() {
        assert_eq!(path_position(0, 0), None);
        assert_eq!(path_position(5, 0), None);
    }

    #[test]
    fn path_position_is_clamped_and_monotonic() {
        for n in 1..8 {
            let mut prev = 0;
            for completed in 0..12 {
                let pos = path_position(completed, n).unwrap();
                assert!(pos <= n - 1);
                assert!(pos >= prev, "position regressed at n={n} completed={completed}");
                prev = pos;
            }
        }
        assert_eq!(path_position(2, 5), Some(2));
        assert_eq!(path_position(9, 5), Some(4));
    }

    #[test]
    fn estimated_completed_uses_real_division() {
        assert_eq!(estimated_completed(0, 5), 0);
        assert_eq!(estimated_completed(1, 5), 1);
        assert_eq!(estimated_completed(20, 5), 1);
        assert_eq!(estimated_completed(21, 5), 2);
        assert_eq!(estimated_completed(50, 5), 3);
        assert_eq!(estimated_completed(1000, 5), 5);
    }

    #[test]
    fn completed_for_current_user_counts_flags() {
        let mut tasks = vec![task("a", 10), task("b", 10), task("c", 10)];
        tasks[2].completed = true;
        let me = player("me", 500, true);
        let friend = player("pat", 30, false);
        assert_eq!(completed_for(&me, &tasks), 1);
        assert_eq!(completed_for(&friend, &tasks), 2);
    }

    // -- coordinates --

    #[test]
    fn coordinates_for_empty_and_single() {
        for layout in [PathLayout::Winding, PathLayout::Arc, PathLayout::Vertical] {
            assert!(path_coordinates(0, layout).is_empty());
            let one = path_coordinates(1, layout);
            assert_eq!(one.len(), 1);
            assert!(close(one[0], 50.0, 50.0));
        }
    }

    #[test]
    fn winding_hits_waypoints_at_ends() {
        let pts = path_coordinates(7, PathLayout::Winding);
        assert_eq!(pts.len(), 7);
        for (p, w) in pts.iter().zip(WINDING_WAYPOINTS.iter()) {
            assert!(close(*p, w.x, w.y), "{p:?} vs {w:?}");
        }
    }

    #[test]
    fn winding_interpolates_between_waypoints() {
        // 13 points: every other one falls halfway along a segment.
        let pts = path_coordinates(13, PathLayout::Winding);
        assert!(close(pts[1], 20.0, 67.5));
        assert!(close(pts[12], 85.0, 20.0));
    }

    #[test]
    fn arc_spans_three_quarters_of_a_circle() {
        let pts = path_coordinates(3, PathLayout::Arc);
        let first_angle = -PI * 0.25;
        assert!(close(
            pts[0],
            50.0 + first_angle.cos() * 35.0,
            50.0 + first_angle.sin() * 35.0
        ));
        // Midpoint angle is pi / 2: straight below the centre.
        assert!(close(pts[1], 50.0, 85.0));
        for p in &pts {
            let r = ((p.x - 50.0).powi(2) + (p.y - 50.0).powi(2)).sqrt();
            assert!((r - 35.0).abs() < 1e-9);
        }
    }

    #[test]
    fn vertical_climbs_and_zigzags() {
        let pts = path_coordinates(4, PathLayout::Vertical);
        assert!(close(pts[0], 25.0, 90.0));
        assert!(close(pts[1], 50.0, 65.0));
        assert!(close(pts[2], 75.0, 40.0));
        assert!(close(pts[3], 25.0, 15.0));
    }

    #[test]
    fn coordinates_stay_in_bounds() {
        for layout in [PathLayout::Winding, PathLayout::Arc, PathLayout::Vertical] {
            for n in 0..30 {
                for p in path_coordinates(n, layout) {
                    assert!((0.0..=100.0).contains(&p.x) && (0.0..=100.0).contains(&p.y));
                }
            }
        }
    }

    #[test]
    fn layout_cycles_and_labels() {
        assert_eq!(PathLayout::Winding.next(), PathLayout::Arc);
        assert_eq!(PathLayout::Vertical.next(), PathLayout::Winding);
        assert_eq!(PathLayout::Arc.label(), "arc");
    }

    // -- checkpoints --

    #[test]
    fn checkpoint_kinds_follow_precedence() {
        let plain = task("p", 10);
        let mut fin = task("f", 20);
        fin.is_final = true;
        let mut boss = task("b", 10);
        boss.boss_type = BossType::Fish2;

        assert_eq!(CheckpointKind::of(0, &fin), CheckpointKind::Final);
        assert_eq!(CheckpointKind::of(0, &boss), CheckpointKind::Start);
        assert_eq!(CheckpointKind::of(3, &boss), CheckpointKind::Boss);
        assert_eq!(CheckpointKind::of(0, &plain), CheckpointKind::Start);
        assert_eq!(CheckpointKind::of(3, &plain), CheckpointKind::Landmark);
        assert_eq!(CheckpointKind::of(6, &plain), CheckpointKind::Landmark);
        assert_eq!(CheckpointKind::of(4, &plain), CheckpointKind::Flower);
        assert_eq!(CheckpointKind::of(5, &plain), CheckpointKind::Bubble);
    }

    // -- due status --

    #[test]
    fn due_status_cases() {
        let now = at(2025, 6, 10, 12, 0);
        let mut t = task("a", 10);
        assert_eq!(DueStatus::of(&t, now), None);

        t.deadline = Some(at(2025, 6, 10, 9, 0));
        assert_eq!(DueStatus::of(&t, now), Some(DueStatus::Overdue));

        t.deadline = Some(at(2025, 6, 10, 18, 0));
        assert_eq!(DueStatus::of(&t, now), Some(DueStatus::Today));

        t.deadline = Some(at(2025, 6, 11, 8, 0));
        assert_eq!(DueStatus::of(&t, now), Some(DueStatus::DaysLeft(1)));

        t.deadline = Some(at(2025, 6, 13, 23, 0));
        assert_eq!(DueStatus::of(&t, now), Some(DueStatus::DaysLeft(3)));

        t.completed = true;
        assert_eq!(DueStatus::of(&t, now), Some(DueStatus::Done));
    }

    #[test]
    fn due_status_labels() {
        assert_eq!(DueStatus::DaysLeft(1).label(), "1 day left");
        assert_eq!(DueStatus::DaysLeft(4).label(), "4 days left");
        assert_eq!(DueStatus::Overdue.label(), "overdue");
    }

    // -- summary --

    #[test]
    fn summary_of_empty_mission() {
        let s = ProgressSummary::compute(&[], at(2025, 1, 1, 0, 0));
        assert_eq!(s.total, 0);
        assert_eq!(s.percentage, 0.0);
        assert!(!s.is_complete());
    }

    #[test]
    fn summary_counts() {
        let now = at(2025, 6, 10, 12, 0);
        let mut a = task("a", 10);
        a.completed = true;
        a.deadline = Some(at(2025, 6, 1, 0, 0));
        let mut b = task("b", 15);
        b.deadline = Some(at(2025, 6, 10, 8, 0));
        let mut c = task("c", 10);
        c.deadline = Some(at(2025, 6, 10, 20, 0));
        let mut d = task("d", 40);
        d.is_final = true;
        d.deadline = Some(at(2025, 6, 20, 0, 0));

        let s = ProgressSummary::compute(&[a, b, c, d], now);
        assert_eq!(s.completed, 1);
        assert_eq!(s.total, 4);
        assert!((s.percentage - 25.0).abs() < 1e-9);
        assert_eq!(s.overdue, 1);
        assert_eq!(s.due_today, 2);
        assert_eq!(s.finals, 1);
        assert_eq!(s.finals_completed, 0);
        assert_eq!(s.points_earned, 10);
    }

    // -- leaderboard --

    #[test]
    fn leaderboard_sorts_and_ranks() {
        let players = vec![
            player("a", 10, false),
            player("b", 50, true),
            player("c", 10, false),
            player("d", 70, false),
        ];
        let board = leaderboard(&players);
        let ids: Vec<_> = board.iter().map(|s| s.player.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
        assert_eq!(board[0].rank, 1);
        assert!(board[0].leader);
        assert!(!board[1].leader);
        assert_eq!(board[0].medal(), Some("🥇"));
        assert_eq!(board[2].medal(), Some("🥉"));
        assert_eq!(board[3].medal(), None);
    }

    #[test]
    fn single_player_gets_no_crown() {
        let board = leaderboard(&[player("solo", 100, true)]);
        assert_eq!(board.len(), 1);
        assert!(!board[0].leader);
    }

    #[test]
    fn completion_pct_rounds() {
        assert_eq!(completion_pct(0, 0), 0);
        assert_eq!(completion_pct(1, 3), 33);
        assert_eq!(completion_pct(2, 3), 67);
        assert_eq!(completion_pct(3, 3), 100);
    }
}
