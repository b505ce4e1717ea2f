// reqwest implementation of `MissionApi`.
//
// Every call is a single JSON request. Non-2xx responses are mapped to
// `ApiError`, unwrapping FastAPI's `{"detail": ...}` bodies so the message
// can be shown to the user.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::types::{AddParticipantBody, LoginResponse, NewUser, ParticipantRecord, PlanRequest, Session};
use crate::api::{ApiError, MissionApi};
use crate::config::ServerConfig;
use crate::mission::authoring::{MissionPayload, NewTask};
use crate::mission::planner::TaskSuggestion;
use crate::mission::{Mission, MissionSummary, Participant, Task, User};

// ---------------------------------------------------------------------------
// HttpApi
// ---------------------------------------------------------------------------

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpApi {
    pub fn from_config(server: &ServerConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: server.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.current_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "GET");
        self.send(self.authorized(self.http.get(url))).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "POST");
        self.send(self.authorized(self.http.post(url).json(body))).await
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err = error_for_status(status, &body);
            warn!(status = status.as_u16(), "request failed: {err}");
            return Err(err);
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MissionApi for HttpApi {
    async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let url = endpoint(&self.base_url, "/auth/login");
        debug!(%url, username, "POST login");
        let req = self
            .http
            .post(url)
            .form(&[("username", username), ("password", password)]);
        let resp: LoginResponse = self.send(req).await?;
        let session = Session::from(resp);
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    async fn register(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post("/users/", user).await
    }

    async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.get(&format!("/users/{user_id}")).await
    }

    async fn user_missions(&self, user_id: &str) -> Result<Vec<MissionSummary>, ApiError> {
        self.get(&format!("/users/{user_id}/missions/")).await
    }

    async fn get_mission(&self, mission_id: &str) -> Result<Mission, ApiError> {
        self.get(&format!("/missions/{mission_id}")).await
    }

    async fn mission_tasks(&self, mission_id: &str) -> Result<Vec<Task>, ApiError> {
        self.get(&format!("/missions/{mission_id}/tasks/")).await
    }

    async fn create_mission_with_tasks(&self, payload: &MissionPayload) -> Result<Mission, ApiError> {
        self.post("/missions/with-tasks", payload).await
    }

    async fn create_task(&self, mission_id: &str, task: &NewTask) -> Result<Task, ApiError> {
        self.post(&format!("/missions/{mission_id}/tasks/"), task).await
    }

    async fn add_participant(
        &self,
        mission_id: &str,
        user_id: &str,
    ) -> Result<ParticipantRecord, ApiError> {
        self.post(
            &format!("/missions/{mission_id}/participants"),
            &AddParticipantBody { user_id },
        )
        .await
    }

    async fn leaderboard(&self, mission_id: &str) -> Result<Vec<Participant>, ApiError> {
        self.get(&format!("/missions/{mission_id}/leaderboard")).await
    }

    async fn plan_mission(&self, prompt: &str) -> Result<Vec<TaskSuggestion>, ApiError> {
        self.post("/ai/plan-mission", &PlanRequest { prompt }).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Join the API root and a path that starts with `/`.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Extract a message from a FastAPI error body.
///
/// `{"detail": "msg"}` yields `msg`; validation errors
/// (`{"detail": [{"msg": ...}, ...]}`) yield their messages joined by `; `.
pub(crate) fn parse_error_detail(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        other => Some(other.to_string()),
    }
}

pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    let detail = parse_error_detail(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status.canonical_reason().unwrap_or("error").to_string()
        } else {
            trimmed.to_string()
        }
    });
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::Unauthorized(detail)
    } else if status == StatusCode::NOT_FOUND {
        ApiError::NotFound(detail)
    } else {
        ApiError::Status {
            status: status.as_u16(),
            detail,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
