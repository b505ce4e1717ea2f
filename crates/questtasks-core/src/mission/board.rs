// Everything the mission screen shows, assembled from a fetched mission, its
// tasks, the locally stored task flags and the signed-in user.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::mission::progress::{
    completed_for, completion_pct, leaderboard, path_coordinates, path_position, sort_by_creation,
    CheckpointKind, PathLayout, PathPoint, ProgressSummary, Standing,
};
use crate::mission::{Mission, Player, Task, User};

/// Local per-task state the backend does not track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFlags {
    pub completed: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissionBoard {
    pub mission: Mission,
    /// Visible tasks in path order with local completion applied.
    pub tasks: Vec<Task>,
    pub layout: PathLayout,
    pub path: Vec<PathPoint>,
    pub checkpoints: Vec<CheckpointKind>,
    pub players: Vec<Player>,
    /// Checkpoint index per entry of `players`.
    pub positions: Vec<Option<usize>>,
    pub standings: Vec<Standing>,
    pub summary: ProgressSummary,
    /// Index into `players` of the signed-in user, if they take part.
    pub current_player: Option<usize>,
}

impl MissionBoard {
    pub fn build(
        mission: &Mission,
        tasks: &[Task],
        flags: &HashMap<String, TaskFlags>,
        user: Option<&User>,
        layout: PathLayout,
        now: NaiveDateTime,
    ) -> Self {
        let visible: Vec<Task> = tasks
            .iter()
            .filter(|t| !flags.get(&t.id).is_some_and(|f| f.hidden))
            .map(|t| {
                let mut t = t.clone();
                if let Some(f) = flags.get(&t.id) {
                    t.completed = f.completed;
                }
                t
            })
            .collect();
        let sorted = sort_by_creation(&visible);

        let mut players = participants_as_players(mission, user, sorted.len());
        for p in players.iter_mut() {
            p.completed_tasks = completed_for(p, &sorted);
        }
        let positions = players
            .iter()
            .map(|p| path_position(p.completed_tasks, sorted.len()))
            .collect();
        let current_player = players.iter().position(|p| p.is_current_user);

        let checkpoints = sorted
            .iter()
            .enumerate()
            .map(|(i, t)| CheckpointKind::of(i, t))
            .collect();

        MissionBoard {
            mission: mission.clone().with_tasks(sorted.clone()),
            path: path_coordinates(sorted.len(), layout),
            layout,
            checkpoints,
            standings: leaderboard(&players),
            summary: ProgressSummary::compute(&sorted, now),
            tasks: sorted,
            players,
            positions,
            current_player,
        }
    }

    /// Recompute the path for another layout.
    pub fn relayout(&mut self, layout: PathLayout) {
        self.layout = layout;
        self.path = path_coordinates(self.tasks.len(), layout);
    }

    pub fn current(&self) -> Option<&Player> {
        self.current_player.map(|i| &self.players[i])
    }

    /// Players standing on checkpoint `index`.
    pub fn players_at(&self, index: usize) -> Vec<&Player> {
        self.players
            .iter()
            .zip(&self.positions)
            .filter(|(_, pos)| **pos == Some(index))
            .map(|(p, _)| p)
            .collect()
    }

    pub fn current_completion_pct(&self) -> u32 {
        completion_pct(self.summary.completed, self.summary.total)
    }
}

/// Map participants to players. A creator who is not a participant joins as
/// a zero-point player.
fn participants_as_players(mission: &Mission, user: Option<&User>, task_count: usize) -> Vec<Player> {
    let user_id = user.map(|u| u.id.as_str());
    let mut players: Vec<Player> = mission
        .participants
        .iter()
        .map(|p| Player {
            id: p.user.id.clone(),
            name: p.user.username.clone(),
            avatar: p.user.avatar.clone().unwrap_or_default(),
            total_points: p.total_points,
            completed_tasks: 0,
            total_tasks: task_count,
            is_current_user: Some(p.user.id.as_str()) == user_id,
        })
        .collect();

    if let Some(u) = user {
        let present = players.iter().any(|p| p.is_current_user);
        if !present && mission.created_by_id == u.id {
            players.push(Player {
                id: u.id.clone(),
                name: u.username.clone(),
                avatar: u.avatar.clone().unwrap_or_default(),
                total_points: 0,
                completed_tasks: 0,
                total_tasks: task_count,
                is_current_user: true,
            });
        }
    }
    players
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{parse_deadline, BossType, Participant};
    use chrono::{DateTime, Utc};

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            username: name.into(),
            email: format!("{name}@bikini.bottom"),
            avatar: None,
        }
    }

    fn participant(u: &User, points: u32) -> Participant {
        Participant {
            mission_id: "m1".into(),
            user_id: u.id.clone(),
            total_points: points,
            user: u.clone(),
        }
    }

    fn task(id: &str, order: i64) -> Task {
        Task {
            id: id.into(),
            title: id.to_uppercase(),
            description: None,
            points: 10,
            deadline: parse_deadline("2025-01-10"),
            completed: false,
            is_final: false,
            created_at: DateTime::<Utc>::from_timestamp(order, 0),
            boss_type: BossType::None,
            boss_name: None,
        }
    }

    fn mission(creator: &str, participants: Vec<Participant>) -> Mission {
        Mission {
            id: "m1".into(),
            name: "Jellyfishing".into(),
            description: None,
            created_by_id: creator.into(),
            tasks: Vec::new(),
            participants,
        }
    }

    fn now() -> NaiveDateTime {
        parse_deadline("2025-01-05 12:00").unwrap()
    }

    #[test]
    fn creator_without_participation_joins_with_zero_points() {
        let me = user("u1", "spongebob");
        let pat = user("u2", "patrick");
        let m = mission("u1", vec![participant(&pat, 40)]);
        let tasks = vec![task("a", 1), task("b", 2), task("c", 3)];

        let board = MissionBoard::build(&m, &tasks, &HashMap::new(), Some(&me), PathLayout::Winding, now());
        assert_eq!(board.players.len(), 2);
        let current = board.current().unwrap();
        assert_eq!(current.id, "u1");
        assert_eq!(current.total_points, 0);
        assert_eq!(board.standings[0].player.id, "u2");
    }

    #[test]
    fn outsider_is_not_added() {
        let me = user("u9", "plankton");
        let pat = user("u2", "patrick");
        let m = mission("u1", vec![participant(&pat, 40)]);
        let board = MissionBoard::build(&m, &[task("a", 1)], &HashMap::new(), Some(&me), PathLayout::Arc, now());
        assert_eq!(board.players.len(), 1);
        assert!(board.current().is_none());
    }

    #[test]
    fn flags_apply_and_hidden_tasks_drop_out() {
        let me = user("u1", "spongebob");
        let m = mission("u1", vec![participant(&me, 0)]);
        let tasks = vec![task("c", 3), task("a", 1), task("b", 2)];
        let mut flags = HashMap::new();
        flags.insert("a".to_string(), TaskFlags { completed: true, hidden: false });
        flags.insert("b".to_string(), TaskFlags { completed: false, hidden: true });

        let board = MissionBoard::build(&m, &tasks, &flags, Some(&me), PathLayout::Vertical, now());
        let ids: Vec<_> = board.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(board.mission.tasks.len(), 2);
        assert!(board.tasks[0].completed);
        assert_eq!(board.path.len(), 2);
        assert_eq!(board.checkpoints.len(), 2);
        assert_eq!(board.summary.completed, 1);
        assert_eq!(board.current_completion_pct(), 50);
        assert_eq!(board.positions[0], Some(1));
        assert_eq!(board.players_at(1).len(), 1);
    }

    #[test]
    fn other_players_are_placed_from_points() {
        let me = user("u1", "spongebob");
        let pat = user("u2", "patrick");
        let m = mission("u1", vec![participant(&me, 0), participant(&pat, 45)]);
        let tasks: Vec<Task> = (0..5).map(|i| task(&format!("t{i}"), i)).collect();

        let board = MissionBoard::build(&m, &tasks, &HashMap::new(), Some(&me), PathLayout::Winding, now());
        assert_eq!(board.positions, vec![Some(0), Some(3)]);
        assert_eq!(board.players[1].completed_tasks, 3);
    }

    #[test]
    fn empty_mission_has_no_positions() {
        let me = user("u1", "spongebob");
        let m = mission("u1", vec![]);
        let board = MissionBoard::build(&m, &[], &HashMap::new(), Some(&me), PathLayout::Winding, now());
        assert!(board.path.is_empty());
        assert_eq!(board.positions, vec![None]);
        assert_eq!(board.summary.percentage, 0.0);
    }

    #[test]
    fn relayout_keeps_task_count() {
        let me = user("u1", "spongebob");
        let m = mission("u1", vec![]);
        let tasks = vec![task("a", 1), task("b", 2)];
        let mut board = MissionBoard::build(&m, &tasks, &HashMap::new(), Some(&me), PathLayout::Winding, now());
        board.relayout(PathLayout::Vertical);
        assert_eq!(board.layout, PathLayout::Vertical);
        assert_eq!(board.path.len(), 2);
        assert_eq!(board.path[0], PathPoint { x: 25.0, y: 90.0 });
    }
}
