use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracelane_core::Step;

/// Viewer actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleHelp,
    Step(Step),
    Parent,
    ChildSamePid,
    PanUp,
    PanDown,
    ZoomIn,
    ZoomOut,
    NextFailure,
    Deselect,
    ResetView,
    Reload,
    ToggleTree,
}

pub fn command_for(key: KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let command = match key.code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('c') if ctrl => Command::Quit,
        KeyCode::Char('?') | KeyCode::F(1) => Command::ToggleHelp,
        KeyCode::Left if ctrl => Command::Parent,
        KeyCode::Right if ctrl => Command::ChildSamePid,
        KeyCode::Left => Command::Step(Step::Back),
        KeyCode::Right => Command::Step(Step::Forward),
        KeyCode::Up => Command::PanUp,
        KeyCode::Down => Command::PanDown,
        KeyCode::Char('+') | KeyCode::Char('=') => Command::ZoomIn,
        KeyCode::Char('-') => Command::ZoomOut,
        KeyCode::Char('f') => Command::NextFailure,
        KeyCode::Esc => Command::Deselect,
        KeyCode::Char('r') => Command::ResetView,
        KeyCode::Char('l') => Command::Reload,
        KeyCode::Char('t') => Command::ToggleTree,
        _ => return None,
    };
    Some(command)
}
