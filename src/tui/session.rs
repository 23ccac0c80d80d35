//! Terminal ownership: raw mode, alternate screen, key input.

use std::io::{self, Stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::debug;

use crate::tui::canvas::Canvas;

/// Set while raw mode is on, so the panic hook knows to restore the terminal.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// The drawing side of the terminal as seen by the main loop.
pub trait Screen {
    /// Grid size, fixed for the whole session.
    fn area(&self) -> Rect;

    /// Flush a finished frame to the terminal.
    fn present(&mut self, canvas: &Canvas) -> io::Result<()>;

    /// Wait up to `wait` for one key press.
    fn pending_key(&mut self, wait: Duration) -> io::Result<Option<KeyEvent>>;

    /// Hand the bare terminal to another program.
    fn suspend(&mut self) -> io::Result<()>;

    /// Take the terminal back after [`Screen::suspend`].
    fn resume(&mut self) -> io::Result<()>;
}

pub struct CrosstermScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    area: Rect,
    active: bool,
}

impl CrosstermScreen {
    pub fn open() -> io::Result<Self> {
        install_panic_hook();
        enter()?;
        // until `Self` exists there is no Drop to leave raw mode for us
        let (terminal, size) = release_on_err(
            Terminal::new(CrosstermBackend::new(io::stdout()))
                .and_then(|t| t.size().map(|size| (t, size))),
            || {
                let _ = leave();
            },
        )?;
        debug!(width = size.width, height = size.height, "terminal opened");

        let mut screen = Self {
            terminal,
            area: Rect::new(0, 0, size.width, size.height),
            active: true,
        };
        screen.terminal.clear()?;
        Ok(screen)
    }
}

fn release_on_err<T>(result: io::Result<T>, release: impl FnOnce()) -> io::Result<T> {
    if result.is_err() {
        release();
    }
    result
}

impl Screen for CrosstermScreen {
    fn area(&self) -> Rect {
        self.area
    }

    fn present(&mut self, canvas: &Canvas) -> io::Result<()> {
        self.terminal
            .draw(|frame| frame.render_widget(canvas, frame.size()))?;
        Ok(())
    }

    fn pending_key(&mut self, wait: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(wait)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    fn suspend(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            leave()?;
        }
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        if !self.active {
            enter()?;
            self.active = true;
            // the previous frame is gone from the real screen
            self.terminal.clear()?;
        }
        Ok(())
    }
}

impl Drop for CrosstermScreen {
    fn drop(&mut self) {
        if self.active {
            let _ = leave();
        }
    }
}

fn enter() -> io::Result<()> {
    enable_raw_mode()?;
    RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
    if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
        let _ = leave();
        return Err(e);
    }
    Ok(())
}

fn leave() -> io::Result<()> {
    RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
    let raw = disable_raw_mode();
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;
    raw
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    static INSTALLED: AtomicBool = AtomicBool::new(false);
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        }
        previous(info);
    }));
}
