//! Long-form viewers that take over the bare terminal while the dashboard is
//! suspended.

use std::io::{self, Write};
use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::{info, warn};

/// A program whose output goes straight to the user's terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExternalCommand {
    pub label: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl ExternalCommand {
    pub fn command_line(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub const JOBS_COMMAND: ExternalCommand = ExternalCommand {
    label: "jobs",
    program: "nomad",
    args: &["job", "status"],
};

pub const LOGS_COMMAND: ExternalCommand = ExternalCommand {
    label: "logs",
    program: "journalctl",
    args: &["-u", "nomad", "-n", "50", "--no-pager"],
};

pub const ACK_PROMPT: &str = "\nPress ENTER to continue...";

/// How long the prompt waits for input before looking at the keep-running
/// flag again.
const ACK_POLL: Duration = Duration::from_millis(100);

pub trait Launcher {
    /// Run `command` to completion with inherited stdio.
    fn run_attached(&mut self, command: &ExternalCommand) -> io::Result<ExitStatus>;

    /// Block until the user confirms they are done reading. Gives up as soon
    /// as `running` clears; returns whether the user acknowledged.
    fn wait_for_ack(&mut self, running: &AtomicBool) -> io::Result<bool>;
}

/// Launcher bound to the process's own stdin/stdout.
#[derive(Debug, Default)]
pub struct TtyLauncher;

impl Launcher for TtyLauncher {
    fn run_attached(&mut self, command: &ExternalCommand) -> io::Result<ExitStatus> {
        info!(command = %command.command_line(), "launching viewer");
        let status = Command::new(command.program)
            .args(command.args)
            .status()
            .inspect_err(|e| {
                // nothing else will tell the user why the screen is empty
                eprintln!("{}: {}", command.program, e);
            })?;
        if !status.success() {
            warn!(command = command.label, %status, "viewer exited unsuccessfully");
        }
        Ok(status)
    }

    fn wait_for_ack(&mut self, running: &AtomicBool) -> io::Result<bool> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{ACK_PROMPT}")?;
        stdout.flush()?;
        wait_for_enter(running, || next_key(ACK_POLL))
    }
}

/// Consume keys until Enter. A blocking line read would sit through SIGINT,
/// so keys are polled in slices and `running` is checked between them.
fn wait_for_enter(
    running: &AtomicBool,
    mut next_key: impl FnMut() -> io::Result<Option<KeyCode>>,
) -> io::Result<bool> {
    while running.load(Ordering::SeqCst) {
        if next_key()? == Some(KeyCode::Enter) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn next_key(wait: Duration) -> io::Result<Option<KeyCode>> {
    if !event::poll(wait)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key.code)),
        _ => Ok(None),
    }
}
