//! Masked password input on the controlling terminal.

use std::io::{Stderr, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};

type PromptResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const MAX_ATTEMPTS: usize = 3;

/// Raw mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> PromptResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Replace the current line with `text`.
fn line(out: &mut Stderr, text: &str) -> PromptResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(text)
    )?;
    out.flush()?;
    Ok(())
}

/// Read one line, echoing `*` per character. Ctrl-C aborts.
pub fn password(label: &str) -> PromptResult<String> {
    let _raw = RawMode::enable()?;
    let mut out = std::io::stderr();
    line(&mut out, label)?;

    let mut typed = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        match (code, ctrl) {
            (KeyCode::Enter, _) => break,
            (KeyCode::Char('c'), true) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            (KeyCode::Backspace, _) if typed.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            (KeyCode::Char(ch), false) => {
                typed.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    out.flush()?;
    Ok(typed)
}

/// Ask for a new password until two entries match.
pub fn new_password() -> PromptResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..MAX_ATTEMPTS {
        let first = password("Password: ")?;
        if first.is_empty() {
            line(&mut out, "Password must not be empty.\r\n")?;
            continue;
        }
        if password("Confirm password: ")? == first {
            return Ok(first);
        }
        line(&mut out, "Passwords do not match. Try again.\r\n")?;
    }

    Err("too many attempts".into())
}
