use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a single key press asks the dashboard to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Quit,
    ShowOrchestratorUrl,
    ShowJobs,
    ShowLogs,
    None,
}

/// Map the key pressed during a tick (if any) to an action. Case-insensitive.
pub fn resolve(key: Option<KeyCode>) -> MenuAction {
    let Some(KeyCode::Char(c)) = key else {
        return MenuAction::None;
    };
    match c.to_ascii_lowercase() {
        'q' => MenuAction::Quit,
        'n' => MenuAction::ShowOrchestratorUrl,
        'j' => MenuAction::ShowJobs,
        'l' => MenuAction::ShowLogs,
        _ => MenuAction::None,
    }
}

/// Ctrl+C while in raw mode arrives as a key event instead of SIGINT.
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}
