// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages for the app
// orchestrator, or into local ViewState mutations (form editing, selection,
// map presentation).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use questtasks_core::mission::progress::PathLayout;

use super::forms::{FormFocus, MissionForm, Overlay, StepField, TaskDialog};
use super::{ViewState, MISSIONS, TASKS};
use crate::protocol::{MissionView, Screen, UserCommand};

/// Rows moved by PageUp/PageDown.
fn page_size() -> isize {
    10
}

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if ctrl(&key_event, 'c') {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.overlay.is_some() {
        return handle_overlay(key_event, view_state);
    }

    match view_state.screen {
        Screen::Login => handle_login(key_event, view_state),
        Screen::Home => handle_home(key_event, view_state),
        Screen::Mission => handle_mission(key_event, view_state),
        Screen::NewMission => handle_new_mission(key_event, view_state),
        Screen::Planner => handle_planner(key_event, view_state),
    }
}

fn ctrl(key_event: &KeyEvent, c: char) -> bool {
    key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char(c)
}

/// Apply a printable character or Backspace to `text`.
fn edit_text(text: &mut String, key_event: &KeyEvent) -> bool {
    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }
    match key_event.code {
        KeyCode::Char(c) => {
            text.push(c);
            true
        }
        KeyCode::Backspace => {
            text.pop();
            true
        }
        _ => false,
    }
}

/// y/q confirm, n/Esc cancel, everything else blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('q') => Some(UserCommand::Quit),
        KeyCode::Char('n') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

fn handle_login(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let form = &mut view_state.login;
    if ctrl(&key_event, 'r') {
        form.toggle_mode();
        return None;
    }
    match key_event.code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Enter => return Some(form.submit()),
        KeyCode::Esc => view_state.confirm_quit = true,
        _ => {
            edit_text(form.field_mut(), &key_event);
        }
    }
    None
}

fn handle_home(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let len = view_state.missions.len();
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => view_state.move_selection(MISSIONS, -1, len),
        KeyCode::Down | KeyCode::Char('j') => view_state.move_selection(MISSIONS, 1, len),
        KeyCode::PageUp => view_state.move_selection(MISSIONS, -page_size(), len),
        KeyCode::PageDown => view_state.move_selection(MISSIONS, page_size(), len),
        KeyCode::Enter => {
            return view_state
                .selected_mission()
                .map(|m| UserCommand::OpenMission(m.id.clone()));
        }
        KeyCode::Char('n') => return Some(UserCommand::SwitchView(Screen::NewMission)),
        KeyCode::Char('a') => return Some(UserCommand::SwitchView(Screen::Planner)),
        KeyCode::Char('r') => return Some(UserCommand::RefreshMissions),
        KeyCode::Char('o') => return Some(UserCommand::Logout),
        KeyCode::Char('q') => view_state.confirm_quit = true,
        _ => {}
    }
    None
}

fn handle_mission(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let len = view_state.board.as_ref().map_or(0, |b| b.tasks.len());
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => view_state.move_selection(TASKS, -1, len),
        KeyCode::Down | KeyCode::Char('j') => view_state.move_selection(TASKS, 1, len),
        KeyCode::PageUp => view_state.move_selection(TASKS, -page_size(), len),
        KeyCode::PageDown => view_state.move_selection(TASKS, page_size(), len),
        KeyCode::Char(' ') | KeyCode::Enter => {
            return view_state.selected_task_id().map(UserCommand::ToggleTask);
        }
        KeyCode::Char('x') | KeyCode::Delete => {
            return view_state.selected_task_id().map(UserCommand::HideTask);
        }
        KeyCode::Char('v') => {
            view_state.mission_view = match view_state.mission_view {
                MissionView::Map => MissionView::List,
                MissionView::List => MissionView::Map,
            };
        }
        KeyCode::Char('l') => cycle_layout(view_state),
        KeyCode::Char('t') => {
            view_state.overlay = Some(Overlay::AddTask(TaskDialog::new(view_state.default_points)));
        }
        KeyCode::Char('i') => {
            view_state.overlay = Some(Overlay::Invite {
                user_id: String::new(),
            });
        }
        KeyCode::Char('r') => {
            return view_state
                .board
                .as_ref()
                .map(|b| UserCommand::OpenMission(b.mission.id.clone()));
        }
        KeyCode::Esc | KeyCode::Char('b') => return Some(UserCommand::SwitchView(Screen::Home)),
        KeyCode::Char('q') => view_state.confirm_quit = true,
        _ => {}
    }
    None
}

fn cycle_layout(view_state: &mut ViewState) {
    let current = view_state
        .layout_choice
        .or_else(|| view_state.board.as_ref().map(|b| b.layout))
        .unwrap_or(PathLayout::Winding);
    let next = current.next();
    view_state.layout_choice = Some(next);
    if let Some(board) = view_state.board.as_mut() {
        board.relayout(next);
    }
}

fn handle_new_mission(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if key_event.code == KeyCode::Esc {
        return Some(UserCommand::SwitchView(Screen::Home));
    }
    if ctrl(&key_event, 'o') {
        open_import(view_state);
        return None;
    }
    handle_form(key_event, &mut view_state.mission_form)
}

fn handle_planner(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let planner = &mut view_state.planner;

    if planner.form.is_some() {
        if key_event.code == KeyCode::Esc {
            // Drop the suggestion and go back to the prompt.
            planner.form = None;
            return None;
        }
        if ctrl(&key_event, 'o') {
            open_import(view_state);
            return None;
        }
        return planner
            .form
            .as_mut()
            .and_then(|form| handle_form(key_event, form));
    }

    match key_event.code {
        KeyCode::Esc => Some(UserCommand::SwitchView(Screen::Home)),
        KeyCode::Enter => planner.request(),
        _ => {
            if !planner.generating {
                edit_text(&mut planner.prompt, &key_event);
            }
            None
        }
    }
}

fn open_import(view_state: &mut ViewState) {
    view_state.overlay = Some(Overlay::Import {
        path: String::new(),
    });
}

/// Keys for a mission authoring form, shared by the new-mission and planner
/// screens.
fn handle_form(key_event: KeyEvent, form: &mut MissionForm) -> Option<UserCommand> {
    if ctrl(&key_event, 's') {
        return Some(form.to_command());
    }

    match key_event.code {
        KeyCode::Tab => {
            form.focus = form.focus.next();
            return None;
        }
        KeyCode::BackTab => {
            form.focus = form.focus.prev();
            return None;
        }
        _ => {}
    }

    match form.focus {
        FormFocus::Steps => match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => form.select_step(-1),
            KeyCode::Down | KeyCode::Char('j') => form.select_step(1),
            KeyCode::Enter | KeyCode::Char('e') => form.edit_selected(),
            KeyCode::Delete | KeyCode::Char('d') => form.remove_selected(),
            _ => {}
        },
        FormFocus::Step(StepField::Boss) => match key_event.code {
            KeyCode::Left => form.editor.boss_type = form.editor.boss_type.prev(),
            KeyCode::Right | KeyCode::Char(' ') => {
                form.editor.boss_type = form.editor.boss_type.next()
            }
            KeyCode::Enter => {
                form.commit_step();
            }
            _ => {}
        },
        FormFocus::Step(_) if key_event.code == KeyCode::Enter => {
            form.commit_step();
        }
        FormFocus::Name | FormFocus::Description if key_event.code == KeyCode::Enter => {
            form.focus = form.focus.next();
        }
        _ => {
            if let Some(text) = form.text_mut() {
                edit_text(text, &key_event);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_overlay(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if key_event.code == KeyCode::Esc {
        view_state.overlay = None;
        return None;
    }

    match view_state.overlay.as_mut()? {
        Overlay::AddTask(dialog) => {
            let cmd = handle_task_dialog(key_event, dialog);
            if cmd.is_some() {
                view_state.overlay = None;
            }
            return cmd;
        }
        Overlay::Invite { user_id: text } | Overlay::Import { path: text } => {
            if key_event.code != KeyCode::Enter {
                edit_text(text, &key_event);
                return None;
            }
        }
    }

    // Enter on a single-line dialog
    let cmd = view_state.overlay.as_ref().and_then(Overlay::submit_line);
    if cmd.is_some() {
        view_state.overlay = None;
    }
    cmd
}

fn handle_task_dialog(key_event: KeyEvent, dialog: &mut TaskDialog) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Tab => dialog.focus_next(),
        KeyCode::BackTab => dialog.focus_prev(),
        KeyCode::Enter => match dialog.to_form() {
            Ok(form) => return Some(UserCommand::AddTask(form)),
            Err(msg) => dialog.error = Some(msg),
        },
        _ => match dialog.focus {
            None => {
                if key_event.code == KeyCode::Char(' ') {
                    dialog.is_final = !dialog.is_final;
                }
            }
            Some(StepField::Boss) => match key_event.code {
                KeyCode::Left => dialog.editor.boss_type = dialog.editor.boss_type.prev(),
                KeyCode::Right | KeyCode::Char(' ') => {
                    dialog.editor.boss_type = dialog.editor.boss_type.next()
                }
                _ => {}
            },
            Some(field) => {
                if let Some(text) = dialog.editor.text_mut(field) {
                    edit_text(text, &key_event);
                }
            }
        },
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
