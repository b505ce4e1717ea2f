// Mission domain model: tasks, bosses, players, and the modules that
// author missions and compute progress along the mission path.

pub mod authoring;
pub mod board;
pub mod import;
pub mod planner;
pub mod progress;

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BossType
// ---------------------------------------------------------------------------

/// Cosmetic checkpoint guardian attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BossType {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "fish-1")]
    Fish1,
    #[serde(rename = "fish-2")]
    Fish2,
    #[serde(rename = "fish-3")]
    Fish3,
    #[serde(rename = "fish-4")]
    Fish4,
    #[serde(rename = "fish-5")]
    Fish5,
    #[serde(rename = "fish-6")]
    Fish6,
}

impl BossType {
    /// Selectable bosses in picker order, `None` first.
    pub const ALL: [BossType; 7] = [
        BossType::None,
        BossType::Fish1,
        BossType::Fish2,
        BossType::Fish3,
        BossType::Fish4,
        BossType::Fish5,
        BossType::Fish6,
    ];

    pub fn is_none(self) -> bool {
        self == BossType::None
    }

    /// Wire identifier, as stored by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            BossType::None => "none",
            BossType::Fish1 => "fish-1",
            BossType::Fish2 => "fish-2",
            BossType::Fish3 => "fish-3",
            BossType::Fish4 => "fish-4",
            BossType::Fish5 => "fish-5",
            BossType::Fish6 => "fish-6",
        }
    }

    /// Parse a wire identifier. Blank input means no boss.
    pub fn parse(s: &str) -> Option<BossType> {
        let s = s.trim();
        if s.is_empty() {
            return Some(BossType::None);
        }
        BossType::ALL.into_iter().find(|b| b.as_str() == s)
    }

    /// The next boss in picker order, wrapping back to `None`.
    pub fn next(self) -> BossType {
        let idx = BossType::ALL.iter().position(|b| *b == self).unwrap_or(0);
        BossType::ALL[(idx + 1) % BossType::ALL.len()]
    }

    /// The previous boss in picker order, wrapping to the last fish.
    pub fn prev(self) -> BossType {
        let idx = BossType::ALL.iter().position(|b| *b == self).unwrap_or(0);
        BossType::ALL[(idx + BossType::ALL.len() - 1) % BossType::ALL.len()]
    }
}

impl fmt::Display for BossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A mission step as the client knows it.
///
/// The backend stores only title, description and points; the remaining
/// fields are sent along on creation and default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub points: u32,
    #[serde(default)]
    pub deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub boss_type: BossType,
    #[serde(default)]
    pub boss_name: Option<String>,
}

impl Task {
    pub fn has_boss(&self) -> bool {
        !self.boss_type.is_none()
    }
}

// ---------------------------------------------------------------------------
// Users and players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A participant as placed on the mission map.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub total_points: u32,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub is_current_user: bool,
}

impl Player {
    /// Two-letter badge used where an avatar image would be shown.
    pub fn initials(&self) -> String {
        self.name.chars().take(2).collect::<String>().to_uppercase()
    }
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// Mission row as listed for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "createdById")]
    pub created_by_id: String,
}

/// Participation record joined with its user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub mission_id: String,
    pub user_id: String,
    #[serde(default)]
    pub total_points: u32,
    pub user: User,
}

/// A single mission with its participants.
///
/// `GET /missions/{id}` does not embed tasks; they are fetched separately and
/// attached with [`Mission::with_tasks`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "createdById")]
    pub created_by_id: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Mission {
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn summary(&self) -> MissionSummary {
        MissionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            created_by_id: self.created_by_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Deadline parsing
// ---------------------------------------------------------------------------

/// Parse a deadline typed by the user.
///
/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM[:SS]`, or a bare date, which
/// means the end of that day.
pub fn parse_deadline(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| NaiveTime::from_hms_opt(23, 59, 0).map(|t| d.and_time(t)))
}

/// Render a deadline the way the forms accept it back.
pub fn format_deadline(deadline: &NaiveDateTime) -> String {
    deadline.format("%Y-%m-%d %H:%M").to_string()
}
