// Login screen: sign in or register.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::field_line;
use crate::tui::forms::{LoginField, LoginForm, LoginMode};
use crate::tui::layout::centered_rect;

const FORM_WIDTH: u16 = 56;
const FORM_HEIGHT: u16 = 11;

pub fn render(frame: &mut Frame, area: Rect, form: &LoginForm) {
    let form_area = centered_rect(FORM_WIDTH, FORM_HEIGHT, area);
    frame.render_widget(Clear, form_area);

    let title = match form.mode {
        LoginMode::SignIn => " Sign in to QuestTasks ",
        LoginMode::Register => " Create a QuestTasks account ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let mut lines = vec![Line::raw("")];
    for field in form.fields() {
        let (label, value) = match field {
            LoginField::Username => ("Username", form.username.clone()),
            LoginField::Email => ("Email", form.email.clone()),
            LoginField::Password => ("Password", mask(&form.password)),
        };
        lines.push(field_line(label, &value, form.focus == *field));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        switch_hint(form.mode),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}

/// One bullet per password character.
pub fn mask(password: &str) -> String {
    "•".repeat(password.chars().count())
}

pub fn switch_hint(mode: LoginMode) -> &'static str {
    match mode {
        LoginMode::SignIn => "  No account yet? Ctrl+R to register.",
        LoginMode::Register => "  Have an account? Ctrl+R to sign in.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn mask_hides_every_char() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("pässword"), "••••••••");
    }

    #[test]
    fn render_never_shows_password() {
        let form = LoginForm {
            username: "alice".into(),
            password: "hunter2".into(),
            ..LoginForm::default()
        };
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &form))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("alice"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn render_register_mode_small_area() {
        let mut form = LoginForm::default();
        form.toggle_mode();
        let backend = TestBackend::new(30, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &form))
            .unwrap();
    }
}
