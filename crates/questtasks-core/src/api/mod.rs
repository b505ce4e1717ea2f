// Access to the QuestTasks REST backend.
//
// `MissionApi` is the seam the app loop talks to; `HttpApi` implements it
// over reqwest. Tests substitute their own implementation.

pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use crate::mission::authoring::{MissionPayload, NewTask};
use crate::mission::planner::TaskSuggestion;
use crate::mission::{Mission, MissionSummary, Participant, Task, User};

pub use client::HttpApi;
pub use types::{LoginResponse, NewUser, ParticipantRecord, Session};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether a cached copy is a sensible fallback for this failure.
    pub fn is_offline(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

// ---------------------------------------------------------------------------
// MissionApi
// ---------------------------------------------------------------------------

#[async_trait]
pub trait MissionApi: Send + Sync {
    /// Exchange credentials for a session. Later requests carry its token.
    async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError>;

    /// Use `token` for later requests, or none after logout.
    fn set_token(&self, token: Option<String>);

    async fn register(&self, user: &NewUser) -> Result<User, ApiError>;

    async fn get_user(&self, user_id: &str) -> Result<User, ApiError>;

    async fn user_missions(&self, user_id: &str) -> Result<Vec<MissionSummary>, ApiError>;

    async fn get_mission(&self, mission_id: &str) -> Result<Mission, ApiError>;

    async fn mission_tasks(&self, mission_id: &str) -> Result<Vec<Task>, ApiError>;

    async fn create_mission_with_tasks(&self, payload: &MissionPayload) -> Result<Mission, ApiError>;

    async fn create_task(&self, mission_id: &str, task: &NewTask) -> Result<Task, ApiError>;

    async fn add_participant(
        &self,
        mission_id: &str,
        user_id: &str,
    ) -> Result<ParticipantRecord, ApiError>;

    async fn leaderboard(&self, mission_id: &str) -> Result<Vec<Participant>, ApiError>;

    async fn plan_mission(&self, prompt: &str) -> Result<Vec<TaskSuggestion>, ApiError>;
}
