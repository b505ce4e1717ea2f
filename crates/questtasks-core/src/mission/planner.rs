// Glue for the AI mission planner: prompt checks before the request and
// conversion of the returned suggestions into an editable draft.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mission::authoring::{MissionDraft, StepDraft};
use crate::mission::BossType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("Describe the mission you want to plan")]
    EmptyPrompt,

    #[error("The description must have at least {min} characters")]
    PromptTooShort { min: usize },

    #[error("The planner returned no steps")]
    NoSuggestions,

    #[error("A deadline {days} days away is out of range")]
    DeadlineOutOfRange { days: i64 },
}

/// One step proposed by `POST /ai/plan-mission`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub points: u32,
}

/// Reject prompts the backend would refuse.
pub fn validate_prompt(prompt: &str, min_len: usize) -> Result<(), PlannerError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::EmptyPrompt);
    }
    if trimmed.chars().count() < min_len {
        return Err(PlannerError::PromptTooShort { min: min_len });
    }
    Ok(())
}

/// Build a draft named after the prompt with one step per suggestion, each
/// due `deadline_days` after `now` and without a boss.
pub fn suggestions_into_draft(
    prompt: &str,
    suggestions: Vec<TaskSuggestion>,
    now: NaiveDateTime,
    deadline_days: i64,
) -> Result<MissionDraft, PlannerError> {
    if suggestions.is_empty() {
        return Err(PlannerError::NoSuggestions);
    }
    let deadline = Duration::try_days(deadline_days)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or(PlannerError::DeadlineOutOfRange {
            days: deadline_days,
        })?;
    let mut draft = MissionDraft::new(prompt.trim(), "");
    for s in suggestions {
        draft.push_unchecked(StepDraft {
            title: s.title,
            description: s.description.unwrap_or_default(),
            points: s.points,
            deadline: Some(deadline),
            boss_type: BossType::None,
            boss_name: String::new(),
        });
    }
    Ok(draft)
}
