use std::io::{self, stdout, Write};
use std::time::Duration;

use crossterm::cursor::{self, MoveTo};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::style::Color::Reset;
use crossterm::style::{Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue, ExecutableCommand};
use log::debug;

use bkmk_core::error::{Error, Result};
use bkmk_core::execution::open_in_editor;

use super::colors::AsTermStyle;
use super::views::{render, Screen};
use super::{Effect, Session};

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Restore the terminal however the session ends
        let _ = disable_raw_mode();
        let mut stdout = stdout();
        let _ = stdout.execute(cursor::Show);
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

/// Cuts `text` to at most `columns` characters.
fn clip(text: &str, columns: usize) -> String {
    text.chars().take(columns).collect()
}

fn paint(screen: &Screen, width: u16, height: u16) -> io::Result<()> {
    let mut stdout = stdout();

    queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

    for (row, line) in screen.lines.iter().take(height as usize).enumerate() {
        queue!(stdout, MoveTo(0, row as u16))?;

        let mut remaining = width as usize;
        for span in &line.spans {
            if remaining == 0 {
                break;
            }
            let text = clip(&span.text, remaining);
            remaining -= text.chars().count();

            let style = span.tone.as_term_style();
            if let Some(foreground) = style.foreground {
                queue!(stdout, SetForegroundColor(foreground))?;
            }
            if let Some(background) = style.background {
                queue!(stdout, SetBackgroundColor(background))?;
            }
            for attribute in style.attributes() {
                queue!(stdout, SetAttribute(attribute))?;
            }

            queue!(
                stdout,
                Print(text),
                SetAttribute(Attribute::Reset),
                SetBackgroundColor(Reset),
                SetForegroundColor(Reset),
            )?;
        }
    }

    match screen.caret {
        Some((column, row)) if row < height as usize => {
            queue!(stdout, MoveTo(column as u16, row as u16), cursor::Show)?;
        }
        _ => queue!(stdout, cursor::Hide)?,
    }

    stdout.flush()
}

/// Hands the terminal back to the user while `run` executes.
fn suspend<T>(run: impl FnOnce() -> T) -> io::Result<T> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, cursor::Show)?;

    let value = run();

    execute!(stdout(), EnterAlternateScreen)?;
    enable_raw_mode()?;
    Ok(value)
}

fn event_loop(session: &mut Session) -> io::Result<()> {
    let mut stdout = stdout();
    stdout.execute(EnterAlternateScreen)?;
    enable_raw_mode()?;

    let _raw_mode_guard = RawModeGuard; // When this goes out of scope, the terminal is restored

    let (width, height) = terminal::size()?;
    session.resize(width, height);

    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            paint(&render(session), session.width, session.height)?;
            needs_redraw = false;
        }

        if !event::poll(Duration::from_millis(500))? {
            continue;
        }

        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                needs_redraw = true;

                match session.handle_key(key_event) {
                    Effect::None => {}
                    Effect::Quit | Effect::Finish => return Ok(()),
                    Effect::OpenEditor { path, editor } => {
                        debug!("Suspending session to edit {}", path.display());
                        let result = suspend(|| open_in_editor(&path, editor.as_deref()))?;
                        session.editor_finished(result);
                    }
                }
            }
            Event::Resize(width, height) => {
                session.resize(width, height);
                needs_redraw = true;
            }
            _ => {}
        }
    }
}

/// Runs the interactive session until the user quits or picks a command.
///
/// The outcome is left on the session: see [`Session::selected`] and
/// [`Session::action_result`].
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or read from.
pub fn run_session(session: &mut Session) -> Result<()> {
    event_loop(session).map_err(Error::Terminal)
}
