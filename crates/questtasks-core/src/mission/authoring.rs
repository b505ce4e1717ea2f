// Mission authoring: step drafts, the mission draft, and the finalization
// rule applied on save (the last step becomes the final task and is worth
// double points).

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mission::BossType;

/// Upper bound for the points of one step, so a doubled final step still
/// fits the backend's integer column.
pub const MAX_POINTS: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// User-facing validation failures. The messages are shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    #[error("Add a title for the step")]
    MissingTitle,

    #[error("Add a deadline for the step")]
    MissingDeadline,

    #[error("Add a name for the boss")]
    MissingBossName,

    #[error("Points must be greater than zero")]
    InvalidPoints,

    #[error("Points must be at most {max}")]
    TooManyPoints { max: u32 },

    #[error("Add a name for the mission")]
    MissingMissionName,

    #[error("Add at least one step")]
    NoSteps,

    #[error("Step {index} does not exist")]
    NoSuchStep { index: usize },
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// A task as sent to `POST /missions/with-tasks` or `POST /missions/{id}/tasks/`.
///
/// The backend persists title, description and points; the rest is carried
/// for clients that read it back. A blank description is sent as `""`,
/// which both endpoints accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub points: u32,
    pub deadline: Option<NaiveDateTime>,
    pub completed: bool,
    pub is_final: bool,
    pub created_at: DateTime<Utc>,
    pub boss_type: BossType,
    pub boss_name: Option<String>,
}

/// Body of `POST /missions/with-tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPayload {
    pub name: String,
    pub description: Option<String>,
    pub created_by_id: String,
    pub tasks: Vec<NewTask>,
}

// ---------------------------------------------------------------------------
// Step drafts
// ---------------------------------------------------------------------------

/// A step as typed into the mission form, before finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDraft {
    pub title: String,
    pub description: String,
    pub points: u32,
    pub deadline: Option<NaiveDateTime>,
    pub boss_type: BossType,
    pub boss_name: String,
}

impl StepDraft {
    /// Blank step with the configured starting points.
    pub fn blank(default_points: u32) -> Self {
        StepDraft {
            title: String::new(),
            description: String::new(),
            points: default_points,
            deadline: None,
            boss_type: BossType::None,
            boss_name: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), AuthoringError> {
        if self.title.trim().is_empty() {
            return Err(AuthoringError::MissingTitle);
        }
        if self.deadline.is_none() {
            return Err(AuthoringError::MissingDeadline);
        }
        if !self.boss_type.is_none() && self.boss_name.trim().is_empty() {
            return Err(AuthoringError::MissingBossName);
        }
        if self.points == 0 {
            return Err(AuthoringError::InvalidPoints);
        }
        if self.points > MAX_POINTS {
            return Err(AuthoringError::TooManyPoints { max: MAX_POINTS });
        }
        Ok(())
    }

    fn into_new_task(self, is_final: bool, created_at: DateTime<Utc>) -> NewTask {
        let points = if is_final {
            self.points.saturating_mul(2)
        } else {
            self.points
        };
        let boss_name = if self.boss_type.is_none() {
            None
        } else {
            non_blank(&self.boss_name)
        };
        NewTask {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            points,
            deadline: self.deadline,
            completed: false,
            is_final,
            created_at,
            boss_type: self.boss_type,
            boss_name,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// ---------------------------------------------------------------------------
// Mission draft
// ---------------------------------------------------------------------------

/// A mission being authored: name, description and accepted steps in
/// creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionDraft {
    pub name: String,
    pub description: String,
    steps: Vec<StepDraft>,
}

impl MissionDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        MissionDraft {
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
        }
    }

    pub fn steps(&self) -> &[StepDraft] {
        &self.steps
    }

    /// Validate `step` and append it.
    pub fn add_step(&mut self, step: StepDraft) -> Result<(), AuthoringError> {
        step.validate()?;
        self.steps.push(step);
        Ok(())
    }

    /// Replace the step at `index` after validating the new content.
    pub fn replace_step(&mut self, index: usize, step: StepDraft) -> Result<(), AuthoringError> {
        step.validate()?;
        let slot = self
            .steps
            .get_mut(index)
            .ok_or(AuthoringError::NoSuchStep { index })?;
        *slot = step;
        Ok(())
    }

    pub fn remove_step(&mut self, index: usize) -> Result<StepDraft, AuthoringError> {
        if index >= self.steps.len() {
            return Err(AuthoringError::NoSuchStep { index });
        }
        Ok(self.steps.remove(index))
    }

    /// Check the draft can be saved.
    pub fn validate(&self) -> Result<(), AuthoringError> {
        if self.name.trim().is_empty() {
            return Err(AuthoringError::MissingMissionName);
        }
        if self.steps.is_empty() {
            return Err(AuthoringError::NoSteps);
        }
        self.steps.iter().try_for_each(StepDraft::validate)
    }

    /// Push a step without validation. Used for planner suggestions, which
    /// are validated as a whole on save.
    pub(crate) fn push_unchecked(&mut self, step: StepDraft) {
        self.steps.push(step);
    }
}

// ---------------------------------------------------------------------------
// Finalization
// ---------------------------------------------------------------------------

/// Turn steps into tasks. The last step is flagged final with its points
/// doubled. Creation timestamps start at `created_at` and advance one
/// millisecond per step so creation order survives a sort.
pub fn finalize_steps(steps: &[StepDraft], created_at: DateTime<Utc>) -> Vec<NewTask> {
    let last = steps.len().saturating_sub(1);
    steps
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, step)| step.into_new_task(i == last, created_at + Duration::milliseconds(i as i64)))
        .collect()
}

/// Validate and finalize `draft` into the body for `POST /missions/with-tasks`.
pub fn build_payload(
    draft: &MissionDraft,
    creator_id: &str,
    now: DateTime<Utc>,
) -> Result<MissionPayload, AuthoringError> {
    draft.validate()?;
    Ok(MissionPayload {
        name: draft.name.trim().to_string(),
        description: non_blank(&draft.description),
        created_by_id: creator_id.to_string(),
        tasks: finalize_steps(&draft.steps, now),
    })
}

// ---------------------------------------------------------------------------
// Single task form
// ---------------------------------------------------------------------------

/// The add-task dialog for an existing mission.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub step: StepDraft,
    pub is_final: bool,
}

impl TaskForm {
    pub fn new(default_points: u32) -> Self {
        TaskForm {
            step: StepDraft::blank(default_points),
            is_final: false,
        }
    }

    /// Validate and build the task. Ticking "final" doubles the points.
    pub fn into_new_task(self, now: DateTime<Utc>) -> Result<NewTask, AuthoringError> {
        self.step.validate()?;
        Ok(self.step.into_new_task(self.is_final, now))
    }
}
