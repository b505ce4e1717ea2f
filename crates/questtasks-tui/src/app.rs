// Application state and orchestration logic.
//
// The central event loop: user commands from the TUI start API calls on
// spawned tasks, their completions come back as `ApiEvent`s, and the
// resulting view state is pushed to the TUI as `UiUpdate`s. Local-only state
// (session, caches, task progress) goes through the SQLite database.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use questtasks_core::api::{MissionApi, NewUser, Session};
use questtasks_core::config::Config;
use questtasks_core::db::Database;
use questtasks_core::mission::authoring::{build_payload, MissionDraft, TaskForm};
use questtasks_core::mission::board::{MissionBoard, TaskFlags};
use questtasks_core::mission::import::read_steps;
use questtasks_core::mission::planner::{suggestions_into_draft, validate_prompt};
use questtasks_core::mission::progress::{PathLayout, ProgressSummary};
use questtasks_core::mission::{Mission, MissionSummary, Task, User};

use crate::protocol::{ApiEvent, ApiFailure, Notice, Screen, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How often the open mission is re-evaluated against the clock and its
/// standings refreshed from the server.
pub const CLOCK_TICK: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub db: Database,
    /// Backend client, shared with spawned request tasks.
    pub api: Arc<dyn MissionApi>,
    /// Spawned tasks report completions through a clone of this sender.
    pub api_tx: mpsc::Sender<ApiEvent>,
    pub session: Option<Session>,
    pub screen: Screen,
    /// Mission shown on the mission screen, tasks attached.
    pub open_mission: Option<Mission>,
    /// Mission requested with `OpenMission` and not yet loaded.
    pub opening: Option<String>,
    pub layout: PathLayout,
    /// Bumped per planner request; older results are discarded.
    pub plan_generation: u64,
    /// API calls started and not yet answered.
    pub in_flight: usize,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        api: Arc<dyn MissionApi>,
        api_tx: mpsc::Sender<ApiEvent>,
    ) -> Self {
        let layout = config.map.layout;
        AppState {
            config,
            db,
            api,
            api_tx,
            session: None,
            screen: Screen::Login,
            open_mission: None,
            opening: None,
            layout,
            plan_generation: 0,
            in_flight: 0,
        }
    }

    /// Load the saved session, if any, and hand its token to the client.
    pub fn restore_session(&mut self) -> bool {
        match self.db.load_session() {
            Ok(Some(session)) => {
                info!(user = %session.user.username, "Restored saved session");
                self.api.set_token(Some(session.token.clone()));
                self.session = Some(session);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to load saved session: {:#}", e);
                false
            }
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    fn task_flags(&self, mission_id: &str) -> HashMap<String, TaskFlags> {
        self.db.task_flags(mission_id).unwrap_or_else(|e| {
            warn!("Failed to read task progress for {}: {:#}", mission_id, e);
            HashMap::new()
        })
    }

    /// Board for the open mission as of now.
    pub fn board(&self) -> Option<MissionBoard> {
        let mission = self.open_mission.as_ref()?;
        let flags = self.task_flags(&mission.id);
        Some(MissionBoard::build(
            mission,
            &mission.tasks,
            &flags,
            self.user(),
            self.layout,
            now_local(),
        ))
    }

    /// Run `call` on its own task and feed its result back to the loop.
    fn spawn<F>(&mut self, call: F)
    where
        F: Future<Output = ApiEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let event = call.await;
            if tx.send(event).await.is_err() {
                debug!("API event dropped, app loop has exited");
            }
        });
    }

    fn start_login(&mut self, username: String, password: String) {
        info!(%username, "Signing in");
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            ApiEvent::LoggedIn(
                api.login(&username, &password)
                    .await
                    .map_err(ApiFailure::from),
            )
        });
    }

    fn refresh_missions(&mut self) {
        let Some(user_id) = self.user().map(|u| u.id.clone()) else {
            return;
        };
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            ApiEvent::Missions(api.user_missions(&user_id).await.map_err(ApiFailure::from))
        });
    }

    fn fetch_mission(&mut self, mission_id: String) {
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = match tokio::try_join!(
                api.get_mission(&mission_id),
                api.mission_tasks(&mission_id)
            ) {
                Ok((mission, tasks)) => Ok(mission.with_tasks(tasks)),
                Err(e) => Err(ApiFailure::from(e)),
            };
            ApiEvent::MissionFetched { mission_id, result }
        });
    }

    fn check_session(&mut self) {
        let Some(user_id) = self.user().map(|u| u.id.clone()) else {
            return;
        };
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            ApiEvent::SessionChecked(api.get_user(&user_id).await.map_err(ApiFailure::from))
        });
    }
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Main application event loop.
///
/// Runs until `UserCommand::Quit` arrives or the command channel closes.
pub async fn run(
    mut api_rx: mpsc::Receiver<ApiEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    startup(&mut state, &ui_tx).await;
    let mut busy = false;
    sync_busy(&state, &mut busy, &ui_tx).await;

    let mut clock = tokio::time::interval(CLOCK_TICK);
    // The first tick completes immediately; consume it so the first
    // refresh happens after one full interval.
    clock.tick().await;

    loop {
        tokio::select! {
            // --- Completed API calls ---
            event = api_rx.recv() => {
                match event {
                    Some(event) => handle_api_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("API channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Clock ---
            _ = clock.tick() => handle_clock_tick(&mut state, &ui_tx).await,
        }

        sync_busy(&state, &mut busy, &ui_tx).await;
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Resume a saved session, sign in with stored credentials, or ask for them.
async fn startup(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    if state.session.is_none() {
        state.restore_session();
    }

    if let Some(user) = state.user().cloned() {
        let _ = ui_tx.send(UiUpdate::Session(Some(user))).await;
        go_home(state, ui_tx).await;
        state.check_session();
        return;
    }

    let _ = ui_tx.send(UiUpdate::Navigate(Screen::Login)).await;
    if let Some((username, password)) = state.config.credentials.login_pair() {
        let (username, password) = (username.to_string(), password.to_string());
        state.start_login(username, password);
    }
}

async fn sync_busy(state: &AppState, busy: &mut bool, ui_tx: &mpsc::Sender<UiUpdate>) {
    let now_busy = state.in_flight > 0;
    if now_busy != *busy {
        *busy = now_busy;
        let _ = ui_tx.send(UiUpdate::Busy(now_busy)).await;
    }
}

async fn notify(ui_tx: &mpsc::Sender<UiUpdate>, notice: Notice) {
    let _ = ui_tx.send(UiUpdate::Notice(notice)).await;
}

async fn go_home(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    state.screen = Screen::Home;
    let _ = ui_tx.send(UiUpdate::Navigate(Screen::Home)).await;
    state.refresh_missions();
}

/// Send the open mission's board. Returns its summary.
async fn push_board(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) -> Option<ProgressSummary> {
    let board = state.board()?;
    let summary = board.summary.clone();
    let _ = ui_tx.send(UiUpdate::MissionLoaded(Box::new(board))).await;
    Some(summary)
}

async fn sign_in(state: &mut AppState, session: Session, ui_tx: &mpsc::Sender<UiUpdate>) {
    info!(user = %session.user.username, "Signed in");
    if let Err(e) = state.db.save_session(&session) {
        warn!("Failed to persist session: {:#}", e);
    }
    state.api.set_token(Some(session.token.clone()));
    let user = session.user.clone();
    state.session = Some(session);

    let _ = ui_tx.send(UiUpdate::Session(Some(user.clone()))).await;
    notify(ui_tx, Notice::success(format!("Welcome, {}!", user.username))).await;
    go_home(state, ui_tx).await;
}

async fn sign_out(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    state.api.set_token(None);
    if let Err(e) = state.db.clear_session() {
        warn!("Failed to clear saved session: {:#}", e);
    }
    state.session = None;
    state.open_mission = None;
    state.opening = None;
    state.screen = Screen::Login;

    let _ = ui_tx.send(UiUpdate::Session(None)).await;
    let _ = ui_tx.send(UiUpdate::Navigate(Screen::Login)).await;
}

/// Report a failed call. A rejected token ends the session.
async fn report_failure(state: &mut AppState, failure: ApiFailure, ui_tx: &mpsc::Sender<UiUpdate>) {
    if failure.unauthorized && state.session.is_some() {
        warn!("Session rejected by server: {}", failure.message);
        sign_out(state, ui_tx).await;
        notify(ui_tx, Notice::error("Your session has expired. Please sign in again.")).await;
    } else {
        notify(ui_tx, Notice::error(failure.message)).await;
    }
}

// ---------------------------------------------------------------------------
// User commands
// ---------------------------------------------------------------------------

async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Login { username, password } => {
            let username = username.trim().to_string();
            if username.is_empty() || password.is_empty() {
                notify(ui_tx, Notice::error("Enter your username and password")).await;
                return;
            }
            state.start_login(username, password);
        }
        UserCommand::Register {
            username,
            email,
            password,
        } => {
            let username = username.trim().to_string();
            let email = email.trim().to_string();
            if username.is_empty() || email.is_empty() || password.is_empty() {
                notify(ui_tx, Notice::error("Fill in username, email and password")).await;
                return;
            }
            info!(%username, "Registering account");
            let api = Arc::clone(&state.api);
            state.spawn(async move {
                let new_user = NewUser {
                    email,
                    username: username.clone(),
                    password: password.clone(),
                    avatar: None,
                };
                let result = api.register(&new_user).await.map_err(ApiFailure::from);
                ApiEvent::Registered {
                    username,
                    password,
                    result,
                }
            });
        }
        UserCommand::Logout => {
            info!("Signing out");
            sign_out(state, ui_tx).await;
            notify(ui_tx, Notice::info("Signed out")).await;
        }
        UserCommand::RefreshMissions => state.refresh_missions(),
        UserCommand::OpenMission(mission_id) => {
            info!(%mission_id, "Opening mission");
            state.opening = Some(mission_id.clone());
            state.fetch_mission(mission_id);
        }
        UserCommand::ToggleTask(task_id) => toggle_task(state, &task_id, ui_tx).await,
        UserCommand::HideTask(task_id) => hide_task(state, &task_id, ui_tx).await,
        UserCommand::AddTask(form) => add_task(state, form, ui_tx).await,
        UserCommand::SaveMission(draft) => save_mission(state, draft, ui_tx).await,
        UserCommand::RequestPlan(prompt) => request_plan(state, prompt, ui_tx).await,
        UserCommand::AddParticipant(user_id) => add_participant(state, &user_id, ui_tx).await,
        UserCommand::ImportSteps(path) => import_steps(&path, ui_tx).await,
        UserCommand::SwitchView(screen) => switch_view(state, screen, ui_tx).await,
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

async fn toggle_task(state: &mut AppState, task_id: &str, ui_tx: &mpsc::Sender<UiUpdate>) {
    let Some(mission) = state.open_mission.as_ref() else {
        return;
    };
    let Some(task) = mission.tasks.iter().find(|t| t.id == task_id) else {
        warn!(%task_id, "Toggle for unknown task");
        return;
    };
    let mission_id = mission.id.clone();
    let (title, points) = (task.title.clone(), task.points);
    let was_done = state
        .task_flags(&mission_id)
        .get(task_id)
        .map_or(task.completed, |f| f.completed);

    if let Err(e) = state.db.set_completed(&mission_id, task_id, !was_done) {
        warn!("Failed to save task progress: {:#}", e);
        notify(ui_tx, Notice::error("Could not save progress")).await;
        return;
    }
    debug!(%task_id, completed = !was_done, "Task toggled");

    let Some(summary) = push_board(state, ui_tx).await else {
        return;
    };
    let notice = if was_done {
        Notice::info(format!("\"{title}\" reopened"))
    } else if summary.is_complete() {
        Notice::success("Mission complete! Every checkpoint reached.")
    } else {
        Notice::success(format!("\"{title}\" done: +{points} points"))
    };
    notify(ui_tx, notice).await;
}

async fn hide_task(state: &mut AppState, task_id: &str, ui_tx: &mpsc::Sender<UiUpdate>) {
    let Some(mission_id) = state.open_mission.as_ref().map(|m| m.id.clone()) else {
        return;
    };
    if let Err(e) = state.db.set_hidden(&mission_id, task_id, true) {
        warn!("Failed to hide task: {:#}", e);
        notify(ui_tx, Notice::error("Could not remove the checkpoint")).await;
        return;
    }
    info!(%mission_id, %task_id, "Task hidden");
    push_board(state, ui_tx).await;
    notify(ui_tx, Notice::info("Checkpoint removed from the map")).await;
}

async fn add_task(state: &mut AppState, form: TaskForm, ui_tx: &mpsc::Sender<UiUpdate>) {
    let Some(mission_id) = state.open_mission.as_ref().map(|m| m.id.clone()) else {
        notify(ui_tx, Notice::error("Open a mission first")).await;
        return;
    };
    let new_task = match form.into_new_task(Utc::now()) {
        Ok(task) => task,
        Err(e) => {
            notify(ui_tx, Notice::error(e.to_string())).await;
            return;
        }
    };

    // The backend echoes only what it stores; keep the rest for display.
    let local = Task {
        id: String::new(),
        title: new_task.title.clone(),
        description: (!new_task.description.is_empty()).then(|| new_task.description.clone()),
        points: new_task.points,
        deadline: new_task.deadline,
        completed: false,
        is_final: new_task.is_final,
        created_at: Some(new_task.created_at),
        boss_type: new_task.boss_type,
        boss_name: new_task.boss_name.clone(),
    };

    info!(%mission_id, title = %new_task.title, "Adding task");
    let api = Arc::clone(&state.api);
    state.spawn(async move {
        let result = api
            .create_task(&mission_id, &new_task)
            .await
            .map_err(ApiFailure::from);
        ApiEvent::TaskCreated {
            mission_id,
            local: Box::new(local),
            result,
        }
    });
}

async fn save_mission(state: &mut AppState, draft: MissionDraft, ui_tx: &mpsc::Sender<UiUpdate>) {
    let Some(creator_id) = state.user().map(|u| u.id.clone()) else {
        notify(ui_tx, Notice::error("Sign in to create missions")).await;
        return;
    };
    let payload = match build_payload(&draft, &creator_id, Utc::now()) {
        Ok(payload) => payload,
        Err(e) => {
            notify(ui_tx, Notice::error(e.to_string())).await;
            return;
        }
    };

    info!(name = %payload.name, steps = payload.tasks.len(), "Creating mission");
    let api = Arc::clone(&state.api);
    state.spawn(async move {
        ApiEvent::MissionCreated(
            api.create_mission_with_tasks(&payload)
                .await
                .map_err(ApiFailure::from),
        )
    });
}

async fn request_plan(state: &mut AppState, prompt: String, ui_tx: &mpsc::Sender<UiUpdate>) {
    if let Err(e) = validate_prompt(&prompt, state.config.planner.min_prompt_len) {
        let _ = ui_tx.send(UiUpdate::PlanFailed(e.to_string())).await;
        return;
    }

    state.plan_generation += 1;
    let generation = state.plan_generation;
    info!(generation, "Requesting mission plan");

    let api = Arc::clone(&state.api);
    state.spawn(async move {
        let result = api.plan_mission(&prompt).await.map_err(ApiFailure::from);
        ApiEvent::Plan {
            generation,
            prompt,
            result,
        }
    });
}

async fn add_participant(state: &mut AppState, user_id: &str, ui_tx: &mpsc::Sender<UiUpdate>) {
    let user_id = user_id.trim().to_string();
    if user_id.is_empty() {
        notify(ui_tx, Notice::error("Enter the user id to invite")).await;
        return;
    }
    let Some(mission) = state.open_mission.as_ref() else {
        return;
    };
    if mission.is_participant(&user_id) {
        notify(ui_tx, Notice::error("User is already a participant in this mission")).await;
        return;
    }

    let mission_id = mission.id.clone();
    info!(%mission_id, %user_id, "Adding participant");
    let api = Arc::clone(&state.api);
    state.spawn(async move {
        let result = api
            .add_participant(&mission_id, &user_id)
            .await
            .map_err(ApiFailure::from);
        ApiEvent::ParticipantAdded { mission_id, result }
    });
}

async fn import_steps(path: &Path, ui_tx: &mpsc::Sender<UiUpdate>) {
    match read_steps(path) {
        Ok(steps) => {
            info!(path = %path.display(), count = steps.len(), "Imported steps");
            let count = steps.len();
            let _ = ui_tx.send(UiUpdate::StepsImported(steps)).await;
            notify(ui_tx, Notice::success(format!("Imported {count} steps"))).await;
        }
        Err(e) => {
            warn!("Step import failed: {}", e);
            notify(ui_tx, Notice::error(e.to_string())).await;
        }
    }
}

async fn switch_view(state: &mut AppState, screen: Screen, ui_tx: &mpsc::Sender<UiUpdate>) {
    if screen != Screen::Login && state.session.is_none() {
        let _ = ui_tx.send(UiUpdate::Navigate(Screen::Login)).await;
        return;
    }
    if screen == Screen::Mission && state.open_mission.is_none() {
        return;
    }
    debug!("Switching to {:?}", screen);
    if screen == Screen::Home {
        go_home(state, ui_tx).await;
        return;
    }
    state.screen = screen;
    let _ = ui_tx.send(UiUpdate::Navigate(screen)).await;
}

async fn handle_clock_tick(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    if state.screen != Screen::Mission {
        return;
    }
    let Some(mission_id) = state.open_mission.as_ref().map(|m| m.id.clone()) else {
        return;
    };
    // Due labels move with the clock even when nothing else changes.
    push_board(state, ui_tx).await;

    let api = Arc::clone(&state.api);
    state.spawn(async move {
        let result = api.leaderboard(&mission_id).await.map_err(ApiFailure::from);
        ApiEvent::Leaderboard { mission_id, result }
    });
}

// ---------------------------------------------------------------------------
// API completions
// ---------------------------------------------------------------------------

async fn handle_api_event(state: &mut AppState, event: ApiEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    state.in_flight = state.in_flight.saturating_sub(1);

    match event {
        ApiEvent::LoggedIn(Ok(session)) => sign_in(state, session, ui_tx).await,
        ApiEvent::LoggedIn(Err(failure)) => {
            warn!("Login failed: {}", failure.message);
            notify(ui_tx, Notice::error(failure.message)).await;
        }

        ApiEvent::Registered {
            username,
            password,
            result,
        } => match result {
            Ok(user) => {
                info!(user_id = %user.id, "Account created");
                notify(ui_tx, Notice::success(format!("Account created for {}", user.username))).await;
                state.start_login(username, password);
            }
            Err(failure) => {
                warn!("Registration failed: {}", failure.message);
                notify(ui_tx, Notice::error(failure.message)).await;
            }
        },

        ApiEvent::SessionChecked(Ok(user)) => {
            let Some(session) = state.session.as_mut() else {
                return;
            };
            if session.user != user {
                session.user = user.clone();
                if let Err(e) = state.db.save_session(session) {
                    warn!("Failed to persist session: {:#}", e);
                }
                let _ = ui_tx.send(UiUpdate::Session(Some(user))).await;
            }
        }
        ApiEvent::SessionChecked(Err(failure)) => {
            if failure.unauthorized {
                report_failure(state, failure, ui_tx).await;
            } else {
                debug!("Session check skipped: {}", failure.message);
            }
        }

        ApiEvent::Missions(result) => on_missions(state, result, ui_tx).await,

        ApiEvent::MissionFetched { mission_id, result } => {
            on_mission_fetched(state, mission_id, result, ui_tx).await
        }

        ApiEvent::MissionCreated(Ok(mission)) => {
            info!(mission_id = %mission.id, "Mission created");
            if let Err(e) = state.db.cache_mission(&mission) {
                warn!("Failed to cache mission: {:#}", e);
            }
            let summary = mission.summary();
            notify(ui_tx, Notice::success(format!("Mission \"{}\" created", summary.name))).await;
            let _ = ui_tx.send(UiUpdate::MissionSaved(summary)).await;
            go_home(state, ui_tx).await;
        }
        ApiEvent::MissionCreated(Err(failure)) => report_failure(state, failure, ui_tx).await,

        ApiEvent::TaskCreated {
            mission_id,
            local,
            result,
        } => match result {
            Ok(created) => {
                let task = Task {
                    id: created.id,
                    ..*local
                };
                let Some(mission) = state.open_mission.as_mut().filter(|m| m.id == mission_id) else {
                    debug!(%mission_id, "Task created for a mission no longer open");
                    return;
                };
                info!(task_id = %task.id, "Task added");
                mission.tasks.push(task);
                if let Err(e) = state.db.cache_mission(mission) {
                    warn!("Failed to cache mission: {:#}", e);
                }
                push_board(state, ui_tx).await;
                notify(ui_tx, Notice::success("Task added")).await;
            }
            Err(failure) => report_failure(state, failure, ui_tx).await,
        },

        ApiEvent::ParticipantAdded { mission_id, result } => match result {
            Ok(record) => {
                info!(%mission_id, user_id = %record.user_id, "Participant added");
                notify(ui_tx, Notice::success("Participant added")).await;
                if state.open_mission.as_ref().is_some_and(|m| m.id == mission_id) {
                    state.fetch_mission(mission_id);
                }
            }
            Err(failure) => report_failure(state, failure, ui_tx).await,
        },

        ApiEvent::Leaderboard { mission_id, result } => match result {
            Ok(participants) => {
                let Some(mission) = state.open_mission.as_mut().filter(|m| m.id == mission_id) else {
                    return;
                };
                if mission.participants != participants {
                    debug!(%mission_id, "Standings changed");
                    mission.participants = participants;
                    if let Err(e) = state.db.cache_mission(mission) {
                        warn!("Failed to cache mission: {:#}", e);
                    }
                    push_board(state, ui_tx).await;
                }
            }
            Err(failure) if failure.unauthorized => report_failure(state, failure, ui_tx).await,
            Err(failure) => debug!("Standings refresh failed: {}", failure.message),
        },

        ApiEvent::Plan {
            generation,
            prompt,
            result,
        } => {
            if generation != state.plan_generation {
                debug!(
                    "Discarding stale plan (gen {} != current {})",
                    generation, state.plan_generation
                );
                return;
            }
            let update = match result {
                Ok(suggestions) => match suggestions_into_draft(
                    &prompt,
                    suggestions,
                    now_local(),
                    state.config.planner.default_deadline_days,
                ) {
                    Ok(draft) => {
                        info!(steps = draft.steps().len(), "Plan ready");
                        UiUpdate::PlanReady(Box::new(draft))
                    }
                    Err(e) => UiUpdate::PlanFailed(e.to_string()),
                },
                Err(failure) => {
                    warn!("Planner request failed: {}", failure.message);
                    UiUpdate::PlanFailed(failure.message)
                }
            };
            let _ = ui_tx.send(update).await;
        }
    }
}

async fn on_missions(
    state: &mut AppState,
    result: Result<Vec<MissionSummary>, ApiFailure>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let Some(user_id) = state.user().map(|u| u.id.clone()) else {
        return;
    };
    match result {
        Ok(missions) => {
            debug!(count = missions.len(), "Missions loaded");
            if let Err(e) = state.db.cache_mission_list(&user_id, &missions) {
                warn!("Failed to cache mission list: {:#}", e);
            }
            let _ = ui_tx.send(UiUpdate::Missions(missions)).await;
        }
        Err(failure) if failure.offline => match state.db.cached_mission_list(&user_id) {
            Ok(Some(missions)) => {
                info!("Offline, showing cached missions");
                let _ = ui_tx.send(UiUpdate::Missions(missions)).await;
                notify(ui_tx, Notice::info("Offline: showing saved missions")).await;
            }
            _ => notify(ui_tx, Notice::error(failure.message)).await,
        },
        Err(failure) => report_failure(state, failure, ui_tx).await,
    }
}

async fn on_mission_fetched(
    state: &mut AppState,
    mission_id: String,
    result: Result<Mission, ApiFailure>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let (mission, offline) = match result {
        Ok(mission) => {
            if let Err(e) = state.db.cache_mission(&mission) {
                warn!("Failed to cache mission: {:#}", e);
            }
            (mission, false)
        }
        Err(failure) if failure.offline => match state.db.cached_mission(&mission_id) {
            Ok(Some(mission)) => (mission, true),
            _ => {
                state.opening = None;
                notify(ui_tx, Notice::error("This mission is not available offline")).await;
                return;
            }
        },
        Err(failure) => {
            if state.opening.as_deref() == Some(mission_id.as_str()) {
                state.opening = None;
            }
            report_failure(state, failure, ui_tx).await;
            return;
        }
    };

    let requested = state.opening.as_deref() == Some(mission_id.as_str());
    let refreshing = state.open_mission.as_ref().is_some_and(|m| m.id == mission_id);
    if !requested && !refreshing {
        debug!(%mission_id, "Discarding mission no longer wanted");
        return;
    }

    state.open_mission = Some(mission);
    push_board(state, ui_tx).await;

    if requested {
        state.opening = None;
        state.screen = Screen::Mission;
        let _ = ui_tx.send(UiUpdate::Navigate(Screen::Mission)).await;
        if offline {
            notify(ui_tx, Notice::info("Offline: showing the saved copy")).await;
        } else if state.board().is_some_and(|b| b.current_player.is_none()) {
            notify(ui_tx, Notice::info("You are not taking part in this mission")).await;
        }
    } else if offline {
        debug!(%mission_id, "Refresh served from cache");
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
