// Terminal UI: screens, input handling and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the app orchestrator knows.
// The app pushes `UiUpdate` messages over an mpsc channel; the TUI applies
// them to `ViewState` and re-renders at ~30 fps. Form editing, selection and
// map presentation are local to the TUI.

pub mod forms;
pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;

use questtasks_core::mission::board::MissionBoard;
use questtasks_core::mission::progress::PathLayout;
use questtasks_core::mission::{MissionSummary, User};

use crate::protocol::{MissionView, Notice, Screen, UiUpdate, UserCommand};

use forms::{LoginForm, MissionForm, Overlay, PlannerForm};
use layout::{build_layout, build_mission_layout};

/// Selection keys into `ViewState::selected`.
pub const MISSIONS: &str = "missions";
pub const TASKS: &str = "tasks";

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
pub struct ViewState {
    pub screen: Screen,
    pub user: Option<User>,
    pub missions: Vec<MissionSummary>,
    pub board: Option<MissionBoard>,
    pub mission_view: MissionView,
    /// Layout picked with `l`; boards arriving later are redrawn with it.
    pub layout_choice: Option<PathLayout>,
    /// Cursor per list, keyed by list name.
    pub selected: HashMap<String, usize>,
    pub login: LoginForm,
    pub mission_form: MissionForm,
    pub planner: PlannerForm,
    pub overlay: Option<Overlay>,
    pub confirm_quit: bool,
    pub busy: bool,
    pub notice: Option<Notice>,
    /// Points pre-filled in new step forms.
    pub default_points: u32,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(10)
    }
}

impl ViewState {
    pub fn new(default_points: u32) -> Self {
        ViewState {
            screen: Screen::Login,
            user: None,
            missions: Vec::new(),
            board: None,
            mission_view: MissionView::Map,
            layout_choice: None,
            selected: HashMap::new(),
            login: LoginForm::default(),
            mission_form: MissionForm::new(default_points),
            planner: PlannerForm::default(),
            overlay: None,
            confirm_quit: false,
            busy: false,
            notice: None,
            default_points,
        }
    }

    pub fn selected(&self, list: &str) -> usize {
        self.selected.get(list).copied().unwrap_or(0)
    }

    /// Move the cursor of `list` by `delta`, staying within `len` rows.
    pub fn move_selection(&mut self, list: &str, delta: isize, len: usize) {
        let current = self.selected(list) as isize;
        let next = if len == 0 {
            0
        } else {
            (current + delta).clamp(0, len as isize - 1) as usize
        };
        self.selected.insert(list.to_string(), next);
    }

    fn clamp_selection(&mut self, list: &str, len: usize) {
        let max = len.saturating_sub(1);
        let entry = self.selected.entry(list.to_string()).or_insert(0);
        *entry = (*entry).min(max);
    }

    pub fn selected_mission(&self) -> Option<&MissionSummary> {
        self.missions.get(self.selected(MISSIONS))
    }

    pub fn selected_task_id(&self) -> Option<String> {
        let board = self.board.as_ref()?;
        board.tasks.get(self.selected(TASKS)).map(|t| t.id.clone())
    }
}

/// Apply a `UiUpdate` to the view state.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Session(Some(user)) => {
            state.user = Some(user);
            state.login.password.clear();
        }
        UiUpdate::Session(None) => {
            state.user = None;
            state.missions.clear();
            state.board = None;
            state.overlay = None;
            state.selected.clear();
        }
        UiUpdate::Navigate(screen) => {
            state.screen = screen;
            state.overlay = None;
            if screen == Screen::Mission {
                state.selected.insert(TASKS.to_string(), 0);
            }
        }
        UiUpdate::Missions(missions) => {
            state.missions = missions;
            let len = state.missions.len();
            state.clamp_selection(MISSIONS, len);
        }
        UiUpdate::MissionLoaded(board) => {
            let mut board = *board;
            if let Some(layout) = state.layout_choice {
                if board.layout != layout {
                    board.relayout(layout);
                }
            }
            state.clamp_selection(TASKS, board.tasks.len());
            state.board = Some(board);
        }
        UiUpdate::MissionSaved(_) => {
            state.mission_form = MissionForm::new(state.default_points);
            state.planner = PlannerForm::default();
        }
        UiUpdate::PlanReady(draft) => {
            state.planner.generating = false;
            state.planner.error = None;
            state.planner.form = Some(MissionForm::from_draft(*draft, state.default_points));
        }
        UiUpdate::PlanFailed(message) => {
            state.planner.generating = false;
            state.planner.error = Some(message);
        }
        UiUpdate::StepsImported(steps) => {
            let form = match (state.screen, state.planner.form.as_mut()) {
                (Screen::Planner, Some(form)) => form,
                _ => &mut state.mission_form,
            };
            form.import(steps);
        }
        UiUpdate::Busy(busy) => {
            state.busy = busy;
        }
        UiUpdate::Notice(notice) => {
            state.notice = Some(notice);
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the full screen from the current view state.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    render_main(frame, layout.main, state);
    widgets::help_bar::render(frame, layout.help_bar, state);

    if let Some(overlay) = &state.overlay {
        widgets::dialog::render(frame, frame.area(), overlay);
    }
    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

fn render_main(frame: &mut Frame, area: ratatui::layout::Rect, state: &ViewState) {
    match state.screen {
        Screen::Login => widgets::login::render(frame, area, &state.login),
        Screen::Home => widgets::mission_list::render(frame, area, state),
        Screen::Mission => {
            let ml = build_mission_layout(area);
            match state.mission_view {
                MissionView::Map => widgets::path_map::render(frame, ml.board, state),
                MissionView::List => widgets::task_list::render(frame, ml.board, state),
            }
            widgets::progress::render(frame, ml.progress, state);
            widgets::leaderboard::render(frame, ml.leaderboard, state);
        }
        Screen::NewMission => {
            widgets::mission_form::render(frame, area, &state.mission_form, "New mission")
        }
        Screen::Planner => widgets::planner::render(frame, area, &state.planner),
    }
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

/// Run the TUI until the user quits or the app closes the update channel.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    mut view_state: ViewState,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Restore the terminal before the default panic output.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. Async keyboard input
    let mut event_stream = EventStream::new();

    // 4. Render interval (~30fps)
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // 5. Main loop
    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // App is shutting down
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events are picked up by the next draw
                    }
                    Some(Err(_)) | None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 6. Restore terminal
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
