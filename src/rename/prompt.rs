use std::io::{self, Write};

use crossterm::{
    cursor::{MoveLeft, MoveToColumn, MoveUp},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, Clear, ClearType},
};

use super::completion::{Completer, InputState, Key};
use crate::error::Result;

const PROMPT: &str = "Filename >";

/// Leaves raw mode however the prompt exits.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

enum Input {
    Key(Key),
    Cancel,
    Ignore,
}

fn translate(event: KeyEvent) -> Input {
    if event.kind != KeyEventKind::Press {
        return Input::Ignore;
    }
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Input::Cancel,
        KeyCode::Esc => Input::Cancel,
        KeyCode::Enter => Input::Key(Key::Enter),
        KeyCode::Tab | KeyCode::Char(' ') => Input::Key(Key::Accept),
        KeyCode::Backspace => Input::Key(Key::Backspace),
        KeyCode::Char(c) => Input::Key(Key::Char(c)),
        _ => Input::Ignore,
    }
}

/// Redraws the proposal line and the prompt line below it.
fn draw(out: &mut impl Write, state: &InputState) -> io::Result<()> {
    execute!(
        out,
        MoveUp(1),
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(state.proposal()),
        Print("\r\n"),
        Clear(ClearType::CurrentLine),
        Print(format!("{PROMPT} {}", state.preview())),
    )?;
    let offset = state.cursor_offset();
    if offset > 0 {
        execute!(out, MoveLeft(u16::try_from(offset).unwrap_or(u16::MAX)))?;
    }
    Ok(())
}

/// Reads keys until Enter. `None` when the user cancels with Esc or Ctrl-C.
pub fn read_name(completer: &Completer) -> Result<Option<String>> {
    let mut out = io::stdout();
    let mut state = InputState::default();

    println!();
    println!();
    let _raw = RawMode::enable()?;
    draw(&mut out, &state)?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        match translate(key_event) {
            Input::Key(key) => {
                let done = state.handle(key, completer);
                draw(&mut out, &state)?;
                if done {
                    execute!(out, Print("\r\n"))?;
                    return Ok(Some(state.accepted));
                }
            }
            Input::Cancel => {
                execute!(out, Print("\r\n"))?;
                return Ok(None);
            }
            Input::Ignore => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_translate_keys() {
        assert!(matches!(
            translate(press(KeyCode::Char(' '), KeyModifiers::NONE)),
            Input::Key(Key::Accept)
        ));
        assert!(matches!(
            translate(press(KeyCode::Char('-'), KeyModifiers::NONE)),
            Input::Key(Key::Char('-'))
        ));
        assert!(matches!(
            translate(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Input::Cancel
        ));
        assert!(matches!(
            translate(press(KeyCode::Left, KeyModifiers::NONE)),
            Input::Ignore
        ));
    }

    #[test]
    fn test_draw_shows_proposal_and_preview() {
        let completer = Completer::from_folder_name("Show.Guest");
        let mut state = InputState::default();
        state.handle(Key::Char('g'), &completer);

        let mut out = Vec::new();
        draw(&mut out, &state).unwrap();
        let text = String::from_utf8_lossy(&out);

        assert!(text.contains("[g => Guest]"));
        assert!(text.contains("Filename > Guest"));
    }
}
