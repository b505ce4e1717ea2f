// Messages exchanged between the TUI, the app orchestrator and the spawned
// API tasks.

use std::path::PathBuf;

use questtasks_core::api::{ApiError, ParticipantRecord, Session};
use questtasks_core::mission::authoring::{MissionDraft, StepDraft, TaskForm};
use questtasks_core::mission::board::MissionBoard;
use questtasks_core::mission::planner::TaskSuggestion;
use questtasks_core::mission::{Mission, MissionSummary, Participant, Task, User};

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Home,
    Mission,
    NewMission,
    Planner,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Home => "My missions",
            Screen::Mission => "Mission",
            Screen::NewMission => "New mission",
            Screen::Planner => "AI planner",
        }
    }
}

/// How the mission screen shows its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissionView {
    #[default]
    Map,
    List,
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    Logout,
    RefreshMissions,
    OpenMission(String),
    ToggleTask(String),
    HideTask(String),
    AddTask(TaskForm),
    SaveMission(MissionDraft),
    RequestPlan(String),
    AddParticipant(String),
    ImportSteps(PathBuf),
    SwitchView(Screen),
    Quit,
}

// ---------------------------------------------------------------------------
// app -> TUI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Signed-in user, or `None` after logout.
    Session(Option<User>),
    Navigate(Screen),
    Missions(Vec<MissionSummary>),
    MissionLoaded(Box<MissionBoard>),
    /// A mission was created; the authoring forms reset.
    MissionSaved(MissionSummary),
    PlanReady(Box<MissionDraft>),
    PlanFailed(String),
    StepsImported(Vec<StepDraft>),
    Busy(bool),
    Notice(Notice),
}

// ---------------------------------------------------------------------------
// API tasks -> app
// ---------------------------------------------------------------------------

/// An API failure reduced to what the app needs to react.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub message: String,
    /// The server could not be reached; cached data may stand in.
    pub offline: bool,
    /// The token was rejected; the session is over.
    pub unauthorized: bool,
}

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        let unauthorized = matches!(err, ApiError::Unauthorized(_));
        let offline = err.is_offline();
        let message = match err {
            ApiError::Unauthorized(detail)
            | ApiError::NotFound(detail)
            | ApiError::Status { detail, .. } => detail,
            other => other.to_string(),
        };
        ApiFailure {
            message,
            offline,
            unauthorized,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiFailure>;

/// Completion of a spawned API call.
#[derive(Debug)]
pub enum ApiEvent {
    LoggedIn(ApiResult<Session>),
    Registered {
        username: String,
        password: String,
        result: ApiResult<User>,
    },
    SessionChecked(ApiResult<User>),
    Missions(ApiResult<Vec<MissionSummary>>),
    MissionFetched {
        mission_id: String,
        result: ApiResult<Mission>,
    },
    MissionCreated(ApiResult<Mission>),
    TaskCreated {
        mission_id: String,
        local: Box<Task>,
        result: ApiResult<Task>,
    },
    ParticipantAdded {
        mission_id: String,
        result: ApiResult<ParticipantRecord>,
    },
    Leaderboard {
        mission_id: String,
        result: ApiResult<Vec<Participant>>,
    },
    Plan {
        generation: u64,
        prompt: String,
        result: ApiResult<Vec<TaskSuggestion>>,
    },
}
