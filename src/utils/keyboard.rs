use std::io::stdout;
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, MoveToColumn, Show},
    event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    Result,
};

/// What the user asked for from the keyboard while monitoring.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    Clear,
    ToggleTimestamps,
}

/// Wait up to `timeout` for a key press and map it to a [`Command`].
///
/// Raw mode is only on for the duration of the poll, so that anything printed
/// in between goes through the normal line discipline.
pub(crate) fn poll_command(timeout: Duration) -> Result<Option<Command>> {
    enable_raw_mode()?;
    execute!(stdout(), Hide)?;
    let result = poll(timeout);
    execute!(stdout(), MoveToColumn(0), Show)?;
    disable_raw_mode()?;

    // It's guaranteed that read() wont block if `poll` returns `Ok(true)`
    if result? {
        if let Event::Key(key) = read()? {
            return Ok(command_for(key));
        }
    }
    Ok(None)
}

pub(crate) fn clear_screen() -> Result<()> {
    execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0))
}

fn command_for(key: KeyEvent) -> Option<Command> {
    // As we are in raw mode, Ctrl+C is captured here as a key event and not
    // delivered as a signal.
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(Command::Quit),
        KeyCode::Char('l') if ctrl => Some(Command::Clear),
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('t') => Some(Command::ToggleTimestamps),
        _ => None,
    }
}

#[test]
fn key_bindings() {
    let ctrl = |c| KeyEvent {
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::CONTROL,
    };
    assert_eq!(command_for(ctrl('c')), Some(Command::Quit));
    assert_eq!(command_for(ctrl('l')), Some(Command::Clear));
    assert_eq!(command_for(KeyCode::Char('q').into()), Some(Command::Quit));
    assert_eq!(command_for(KeyCode::Esc.into()), Some(Command::Quit));
    assert_eq!(
        command_for(KeyCode::Char('t').into()),
        Some(Command::ToggleTimestamps)
    );
    assert_eq!(command_for(KeyCode::Char('l').into()), None);
    assert_eq!(command_for(KeyCode::Enter.into()), None);
}
