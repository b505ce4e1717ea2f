// Editable form state for the login, authoring and planner screens and the
// mission-screen dialogs.
//
// Forms hold raw text as typed. Conversion into domain drafts happens on
// submit, and any error is kept on the form for display.

use std::path::PathBuf;

use questtasks_core::mission::authoring::{MissionDraft, StepDraft, TaskForm};
use questtasks_core::mission::{format_deadline, parse_deadline, BossType};

use crate::protocol::UserCommand;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    #[default]
    SignIn,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Email,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub mode: LoginMode,
    pub username: String,
    pub email: String,
    pub password: String,
    pub focus: LoginField,
}

impl LoginForm {
    /// Fields shown in the current mode, in focus order.
    pub fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::SignIn => &[LoginField::Username, LoginField::Password],
            LoginMode::Register => &[LoginField::Username, LoginField::Email, LoginField::Password],
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = cycle(self.fields(), self.focus, 1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = cycle(self.fields(), self.focus, -1);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::SignIn => LoginMode::Register,
            LoginMode::Register => LoginMode::SignIn,
        };
        if !self.fields().contains(&self.focus) {
            self.focus = LoginField::Username;
        }
    }

    pub fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn submit(&self) -> UserCommand {
        match self.mode {
            LoginMode::SignIn => UserCommand::Login {
                username: self.username.clone(),
                password: self.password.clone(),
            },
            LoginMode::Register => UserCommand::Register {
                username: self.username.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
            },
        }
    }
}

fn cycle<T: Copy + PartialEq>(order: &[T], current: T, step: isize) -> T {
    let len = order.len() as isize;
    let idx = order.iter().position(|f| *f == current).unwrap_or(0) as isize;
    order[(idx + step).rem_euclid(len) as usize]
}

// ---------------------------------------------------------------------------
// Step editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepField {
    Title,
    Description,
    Points,
    Deadline,
    Boss,
    BossName,
}

impl StepField {
    pub const ORDER: [StepField; 6] = [
        StepField::Title,
        StepField::Description,
        StepField::Points,
        StepField::Deadline,
        StepField::Boss,
        StepField::BossName,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StepField::Title => "Title",
            StepField::Description => "Description",
            StepField::Points => "Points",
            StepField::Deadline => "Deadline",
            StepField::Boss => "Boss",
            StepField::BossName => "Boss name",
        }
    }
}

/// Raw input for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEditor {
    pub title: String,
    pub description: String,
    pub points: String,
    pub deadline: String,
    pub boss_type: BossType,
    pub boss_name: String,
}

impl StepEditor {
    pub fn new(default_points: u32) -> Self {
        StepEditor {
            title: String::new(),
            description: String::new(),
            points: default_points.to_string(),
            deadline: String::new(),
            boss_type: BossType::None,
            boss_name: String::new(),
        }
    }

    pub fn from_draft(step: &StepDraft) -> Self {
        StepEditor {
            title: step.title.clone(),
            description: step.description.clone(),
            points: step.points.to_string(),
            deadline: step.deadline.as_ref().map(format_deadline).unwrap_or_default(),
            boss_type: step.boss_type,
            boss_name: step.boss_name.clone(),
        }
    }

    /// Parse the typed values. Field rules (title, deadline, boss name)
    /// are checked by the draft itself.
    pub fn to_draft(&self) -> Result<StepDraft, String> {
        let points = self
            .points
            .trim()
            .parse::<u32>()
            .map_err(|_| "Points must be a whole number".to_string())?;
        let deadline = match self.deadline.trim() {
            "" => None,
            raw => Some(
                parse_deadline(raw)
                    .ok_or_else(|| "Write the deadline as YYYY-MM-DD HH:MM".to_string())?,
            ),
        };
        Ok(StepDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            points,
            deadline,
            boss_type: self.boss_type,
            boss_name: self.boss_name.clone(),
        })
    }

    /// Text behind `field`. The boss picker is not free text.
    pub fn text_mut(&mut self, field: StepField) -> Option<&mut String> {
        match field {
            StepField::Title => Some(&mut self.title),
            StepField::Description => Some(&mut self.description),
            StepField::Points => Some(&mut self.points),
            StepField::Deadline => Some(&mut self.deadline),
            StepField::Boss => None,
            StepField::BossName => Some(&mut self.boss_name),
        }
    }

    pub fn value(&self, field: StepField) -> String {
        match field {
            StepField::Title => self.title.clone(),
            StepField::Description => self.description.clone(),
            StepField::Points => self.points.clone(),
            StepField::Deadline => self.deadline.clone(),
            StepField::Boss => boss_label(self.boss_type).to_string(),
            StepField::BossName => self.boss_name.clone(),
        }
    }
}

pub fn boss_label(boss: BossType) -> &'static str {
    if boss.is_none() {
        "no boss"
    } else {
        boss.as_str()
    }
}

// ---------------------------------------------------------------------------
// Mission form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Name,
    Description,
    Step(StepField),
    Steps,
}

impl FormFocus {
    fn order() -> Vec<FormFocus> {
        let mut order = vec![FormFocus::Name, FormFocus::Description];
        order.extend(StepField::ORDER.iter().map(|f| FormFocus::Step(*f)));
        order.push(FormFocus::Steps);
        order
    }

    pub fn next(self) -> FormFocus {
        cycle(&FormFocus::order(), self, 1)
    }

    pub fn prev(self) -> FormFocus {
        cycle(&FormFocus::order(), self, -1)
    }
}

/// Mission authoring form: name, description, a step editor and the list of
/// accepted steps.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionForm {
    pub draft: MissionDraft,
    pub editor: StepEditor,
    pub focus: FormFocus,
    pub selected_step: usize,
    /// Step loaded into the editor for changes.
    pub editing: Option<usize>,
    pub error: Option<String>,
    default_points: u32,
}

impl MissionForm {
    pub fn new(default_points: u32) -> Self {
        Self::from_draft(MissionDraft::default(), default_points)
    }

    pub fn from_draft(draft: MissionDraft, default_points: u32) -> Self {
        MissionForm {
            draft,
            editor: StepEditor::new(default_points),
            focus: FormFocus::Name,
            selected_step: 0,
            editing: None,
            error: None,
            default_points,
        }
    }

    /// Free-text field under focus.
    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormFocus::Name => Some(&mut self.draft.name),
            FormFocus::Description => Some(&mut self.draft.description),
            FormFocus::Step(field) => self.editor.text_mut(field),
            FormFocus::Steps => None,
        }
    }

    /// Add the editor's step, or write it back over the step being edited.
    pub fn commit_step(&mut self) -> bool {
        let step = match self.editor.to_draft() {
            Ok(step) => step,
            Err(msg) => {
                self.error = Some(msg);
                return false;
            }
        };
        let result = match self.editing {
            Some(index) => self.draft.replace_step(index, step),
            None => self.draft.add_step(step),
        };
        match result {
            Ok(()) => {
                self.editor = StepEditor::new(self.default_points);
                self.editing = None;
                self.error = None;
                self.focus = FormFocus::Step(StepField::Title);
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub fn edit_selected(&mut self) {
        if let Some(step) = self.draft.steps().get(self.selected_step) {
            self.editor = StepEditor::from_draft(step);
            self.editing = Some(self.selected_step);
            self.focus = FormFocus::Step(StepField::Title);
            self.error = None;
        }
    }

    pub fn remove_selected(&mut self) {
        let index = self.selected_step;
        if self.draft.remove_step(index).is_err() {
            return;
        }
        self.editing = match self.editing {
            Some(e) if e == index => {
                self.editor = StepEditor::new(self.default_points);
                None
            }
            Some(e) if e > index => Some(e - 1),
            other => other,
        };
        self.selected_step = index.min(self.draft.steps().len().saturating_sub(1));
    }

    pub fn select_step(&mut self, delta: isize) {
        let len = self.draft.steps().len();
        if len == 0 {
            self.selected_step = 0;
            return;
        }
        let next = (self.selected_step as isize + delta).clamp(0, len as isize - 1);
        self.selected_step = next as usize;
    }

    /// Append imported steps after the existing ones.
    pub fn import(&mut self, steps: Vec<StepDraft>) {
        for step in steps {
            if let Err(e) = self.draft.add_step(step) {
                self.error = Some(e.to_string());
                return;
            }
        }
        self.error = None;
    }

    /// Draft to save, with the typed name and description.
    pub fn to_command(&self) -> UserCommand {
        UserCommand::SaveMission(self.draft.clone())
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerForm {
    pub prompt: String,
    pub generating: bool,
    pub error: Option<String>,
    /// Suggested mission, editable before saving.
    pub form: Option<MissionForm>,
}

impl PlannerForm {
    pub fn request(&mut self) -> Option<UserCommand> {
        if self.generating {
            return None;
        }
        self.generating = true;
        self.error = None;
        Some(UserCommand::RequestPlan(self.prompt.clone()))
    }
}

// ---------------------------------------------------------------------------
// Mission-screen dialogs
// ---------------------------------------------------------------------------

/// Add-task dialog. Focus walks the step fields, then the "final" toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDialog {
    pub editor: StepEditor,
    pub is_final: bool,
    /// `None` when the "final" toggle has focus.
    pub focus: Option<StepField>,
    pub error: Option<String>,
}

impl TaskDialog {
    pub fn new(default_points: u32) -> Self {
        TaskDialog {
            editor: StepEditor::new(default_points),
            is_final: false,
            focus: Some(StepField::Title),
            error: None,
        }
    }

    fn order() -> Vec<Option<StepField>> {
        let mut order: Vec<Option<StepField>> = StepField::ORDER.iter().copied().map(Some).collect();
        order.push(None);
        order
    }

    pub fn focus_next(&mut self) {
        self.focus = cycle(&Self::order(), self.focus, 1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = cycle(&Self::order(), self.focus, -1);
    }

    /// Validated form, or the message to show.
    pub fn to_form(&self) -> Result<TaskForm, String> {
        let step = self.editor.to_draft()?;
        step.validate().map_err(|e| e.to_string())?;
        Ok(TaskForm {
            step,
            is_final: self.is_final,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    AddTask(TaskDialog),
    Invite { user_id: String },
    Import { path: String },
}

impl Overlay {
    pub fn title(&self) -> &'static str {
        match self {
            Overlay::AddTask(_) => "Add task",
            Overlay::Invite { .. } => "Invite participant",
            Overlay::Import { .. } => "Import steps from CSV",
        }
    }

    /// Command for a single-line dialog's Enter key.
    pub fn submit_line(&self) -> Option<UserCommand> {
        match self {
            Overlay::Invite { user_id } => Some(UserCommand::AddParticipant(user_id.trim().to_string())),
            Overlay::Import { path } => {
                let path = path.trim();
                (!path.is_empty()).then(|| UserCommand::ImportSteps(PathBuf::from(path)))
            }
            Overlay::AddTask(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_editor(title: &str) -> StepEditor {
        StepEditor {
            title: title.into(),
            description: String::new(),
            points: "15".into(),
            deadline: "2025-07-01 18:00".into(),
            boss_type: BossType::None,
            boss_name: String::new(),
        }
    }

    #[test]
    fn login_focus_follows_mode() {
        let mut form = LoginForm::default();
        form.focus_next();
        assert_eq!(form.focus, LoginField::Password);
        form.focus_next();
        assert_eq!(form.focus, LoginField::Username);

        form.toggle_mode();
        form.focus_next();
        assert_eq!(form.focus, LoginField::Email);
        form.focus_prev();
        form.focus_prev();
        assert_eq!(form.focus, LoginField::Password);

        // Email vanishes when switching back; focus resets.
        form.focus = LoginField::Email;
        form.toggle_mode();
        assert_eq!(form.focus, LoginField::Username);
    }

    #[test]
    fn login_submit_per_mode() {
        let mut form = LoginForm {
            username: "alice".into(),
            email: "a@example.com".into(),
            password: "pw".into(),
            ..LoginForm::default()
        };
        assert_eq!(
            form.submit(),
            UserCommand::Login {
                username: "alice".into(),
                password: "pw".into()
            }
        );
        form.toggle_mode();
        assert!(matches!(form.submit(), UserCommand::Register { ref email, .. } if email == "a@example.com"));
    }

    #[test]
    fn editor_parses_points_and_deadline() {
        let step = filled_editor("Buy seeds").to_draft().unwrap();
        assert_eq!(step.points, 15);
        assert_eq!(step.deadline, parse_deadline("2025-07-01 18:00"));

        let mut bad = filled_editor("x");
        bad.points = "ten".into();
        assert_eq!(bad.to_draft().unwrap_err(), "Points must be a whole number");

        let mut bad = filled_editor("x");
        bad.deadline = "next week".into();
        assert!(bad.to_draft().unwrap_err().contains("YYYY-MM-DD"));

        let mut blank = filled_editor("x");
        blank.deadline = "  ".into();
        assert_eq!(blank.to_draft().unwrap().deadline, None);
    }

    #[test]
    fn editor_round_trips_a_draft() {
        let step = filled_editor("Water").to_draft().unwrap();
        assert_eq!(StepEditor::from_draft(&step), filled_editor("Water"));
    }

    #[test]
    fn commit_adds_then_resets() {
        let mut form = MissionForm::new(10);
        form.editor = filled_editor("Dig");
        assert!(form.commit_step());
        assert_eq!(form.draft.steps().len(), 1);
        assert_eq!(form.editor, StepEditor::new(10));
        assert_eq!(form.focus, FormFocus::Step(StepField::Title));
        assert!(form.error.is_none());
    }

    #[test]
    fn commit_reports_validation_error() {
        let mut form = MissionForm::new(10);
        form.editor = filled_editor("  ");
        assert!(!form.commit_step());
        assert_eq!(form.error.as_deref(), Some("Add a title for the step"));

        form.editor = filled_editor("Fight");
        form.editor.boss_type = BossType::Fish2;
        assert!(!form.commit_step());
        assert_eq!(form.error.as_deref(), Some("Add a name for the boss"));
        assert!(form.draft.steps().is_empty());
    }

    #[test]
    fn edit_and_replace_step() {
        let mut form = MissionForm::new(10);
        form.editor = filled_editor("One");
        form.commit_step();
        form.editor = filled_editor("Two");
        form.commit_step();

        form.selected_step = 1;
        form.edit_selected();
        assert_eq!(form.editing, Some(1));
        assert_eq!(form.editor.title, "Two");

        form.editor.title = "Second".into();
        assert!(form.commit_step());
        assert_eq!(form.draft.steps()[1].title, "Second");
        assert_eq!(form.draft.steps().len(), 2);
    }

    #[test]
    fn remove_step_adjusts_selection_and_editing() {
        let mut form = MissionForm::new(10);
        for t in ["A", "B", "C"] {
            form.editor = filled_editor(t);
            form.commit_step();
        }
        form.selected_step = 2;
        form.edit_selected();

        form.selected_step = 0;
        form.remove_selected();
        assert_eq!(form.editing, Some(1));
        assert_eq!(form.draft.steps()[0].title, "B");

        form.selected_step = 1;
        form.remove_selected();
        assert_eq!(form.editing, None);
        assert_eq!(form.selected_step, 0);
        assert_eq!(form.editor, StepEditor::new(10));
    }

    #[test]
    fn select_step_clamps() {
        let mut form = MissionForm::new(10);
        form.select_step(1);
        assert_eq!(form.selected_step, 0);
        form.editor = filled_editor("A");
        form.commit_step();
        form.editor = filled_editor("B");
        form.commit_step();
        form.select_step(5);
        assert_eq!(form.selected_step, 1);
        form.select_step(-3);
        assert_eq!(form.selected_step, 0);
    }

    #[test]
    fn focus_order_wraps() {
        assert_eq!(FormFocus::Name.next(), FormFocus::Description);
        assert_eq!(FormFocus::Description.next(), FormFocus::Step(StepField::Title));
        assert_eq!(FormFocus::Step(StepField::BossName).next(), FormFocus::Steps);
        assert_eq!(FormFocus::Steps.next(), FormFocus::Name);
        assert_eq!(FormFocus::Name.prev(), FormFocus::Steps);
    }

    #[test]
    fn planner_request_once_while_generating() {
        let mut planner = PlannerForm {
            prompt: "Plan a garden makeover".into(),
            ..PlannerForm::default()
        };
        assert_eq!(
            planner.request(),
            Some(UserCommand::RequestPlan("Plan a garden makeover".into()))
        );
        assert!(planner.generating);
        assert_eq!(planner.request(), None);
    }

    #[test]
    fn task_dialog_validates() {
        let mut dialog = TaskDialog::new(10);
        assert_eq!(dialog.to_form().unwrap_err(), "Add a title for the step");

        dialog.editor = filled_editor("Harvest");
        dialog.is_final = true;
        let form = dialog.to_form().unwrap();
        assert!(form.is_final);
        assert_eq!(form.step.title, "Harvest");
    }

    #[test]
    fn task_dialog_focus_reaches_final_toggle() {
        let mut dialog = TaskDialog::new(10);
        dialog.focus_prev();
        assert_eq!(dialog.focus, None);
        dialog.focus_next();
        assert_eq!(dialog.focus, Some(StepField::Title));
    }

    #[test]
    fn single_line_overlays_submit() {
        let invite = Overlay::Invite {
            user_id: " u42 ".into(),
        };
        assert_eq!(invite.submit_line(), Some(UserCommand::AddParticipant("u42".into())));

        let import = Overlay::Import { path: "  ".into() };
        assert_eq!(import.submit_line(), None);
        let import = Overlay::Import {
            path: "steps.csv".into(),
        };
        assert_eq!(
            import.submit_line(),
            Some(UserCommand::ImportSteps(PathBuf::from("steps.csv")))
        );
    }
}
