use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::metrics::{MetricsSnapshot, MetricsSource, ShellMetrics, SystemRunner};
use crate::tui::canvas::{Canvas, Palette};
use crate::tui::input::{self, MenuAction};
use crate::tui::launcher::{ExternalCommand, Launcher, TtyLauncher, JOBS_COMMAND, LOGS_COMMAND};
use crate::tui::panels::dashboard::{render_dashboard_panel, render_notice};
use crate::tui::session::{CrosstermScreen, Screen};

pub const ORCHESTRATOR_URL: &str = "http://localhost:4646";
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Longest stretch the loop goes without looking at the keep-running flag.
const INTERRUPT_CHECK: Duration = Duration::from_millis(100);

/// Who owns the terminal right now.
#[derive(Debug)]
pub enum Mode {
    /// The dashboard draws onto its canvas every tick.
    Dashboard(Canvas),
    /// An external viewer has the bare terminal; there is nothing to draw on.
    Suspended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    Interrupted,
}

/// Why the main loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    Interrupted,
}

/// Failure confined to a single tick. The loop logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("failed to draw dashboard: {0}")]
    Draw(#[source] io::Error),
    #[error("failed to read keyboard input: {0}")]
    Input(#[source] io::Error),
    #[error("failed to release terminal: {0}")]
    Suspend(#[source] io::Error),
    #[error("failed to reacquire terminal: {0}")]
    Resume(#[source] io::Error),
}

pub struct App<S, M, L> {
    screen: S,
    metrics: M,
    launcher: L,
    area: Rect,
    mode: Mode,
    running: Arc<AtomicBool>,
    refresh_interval: Duration,
    notice_duration: Duration,
}

impl<S: Screen, M: MetricsSource, L: Launcher> App<S, M, L> {
    pub fn new(
        screen: S,
        metrics: M,
        launcher: L,
        running: Arc<AtomicBool>,
        refresh_interval: Duration,
    ) -> Self {
        let area = screen.area();
        Self {
            screen,
            metrics,
            launcher,
            area,
            mode: Mode::Dashboard(Canvas::new(area, Palette::standard())),
            running,
            refresh_interval,
            notice_duration: NOTICE_DURATION,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn run(&mut self) -> ExitReason {
        info!(interval_ms = self.refresh_interval.as_millis() as u64, "dashboard started");
        let mut reason = ExitReason::Interrupted;
        while self.is_running() {
            match self.tick() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => {
                    reason = ExitReason::Quit;
                    break;
                }
                Ok(Flow::Interrupted) => break,
                Err(e) => {
                    warn!(error = %e, "tick failed, continuing");
                    self.idle(self.refresh_interval);
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);
        info!(?reason, "dashboard stopped");
        reason
    }

    /// One pass of poll, draw, and input handling.
    pub fn tick(&mut self) -> Result<Flow, TickError> {
        if matches!(self.mode, Mode::Suspended) {
            self.resume()?;
        }

        let snapshot = self.metrics.poll();
        self.draw(&snapshot)?;

        let key = self
            .screen
            .pending_key(self.refresh_interval)
            .map_err(TickError::Input)?;
        if key.as_ref().is_some_and(input::is_interrupt) {
            info!("interrupt key pressed");
            self.running.store(false, Ordering::SeqCst);
            return Ok(Flow::Interrupted);
        }

        match input::resolve(key.map(|k| k.code)) {
            MenuAction::Quit => Ok(Flow::Quit),
            MenuAction::ShowOrchestratorUrl => {
                self.show_notice(&format!("Nomad UI: {ORCHESTRATOR_URL}"))?;
                Ok(Flow::Continue)
            }
            MenuAction::ShowJobs => {
                self.run_external(&JOBS_COMMAND)?;
                Ok(Flow::Continue)
            }
            MenuAction::ShowLogs => {
                self.run_external(&LOGS_COMMAND)?;
                Ok(Flow::Continue)
            }
            MenuAction::None => Ok(Flow::Continue),
        }
    }

    fn draw(&mut self, snapshot: &MetricsSnapshot) -> Result<(), TickError> {
        let Mode::Dashboard(canvas) = &mut self.mode else {
            return Ok(());
        };
        canvas.clear();
        render_dashboard_panel(canvas, snapshot);
        self.screen.present(canvas).map_err(TickError::Draw)
    }

    fn show_notice(&mut self, message: &str) -> Result<(), TickError> {
        if let Mode::Dashboard(canvas) = &mut self.mode {
            render_notice(canvas, message);
            self.screen.present(canvas).map_err(TickError::Draw)?;
        }
        self.hold(self.notice_duration)
    }

    /// Keep the current frame up for `duration`, discarding keys but still
    /// honouring an interrupt.
    fn hold(&mut self, duration: Duration) -> Result<(), TickError> {
        let deadline = Instant::now() + duration;
        while self.is_running() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            let key = self
                .screen
                .pending_key(left.min(INTERRUPT_CHECK))
                .map_err(TickError::Input)?;
            if key.as_ref().is_some_and(input::is_interrupt) {
                self.running.store(false, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    /// Dashboard -> Suspended -> (viewer, acknowledgment) -> Dashboard.
    fn run_external(&mut self, command: &ExternalCommand) -> Result<(), TickError> {
        self.screen.suspend().map_err(TickError::Suspend)?;
        self.mode = Mode::Suspended;
        info!(viewer = command.label, "dashboard suspended");

        match self.launcher.run_attached(command) {
            Ok(status) if !status.success() => {
                warn!(viewer = command.label, %status, "viewer failed");
            }
            Ok(_) => {}
            Err(e) => warn!(viewer = command.label, error = %e, "viewer could not start"),
        }

        // a Ctrl+C during the viewer or the prompt reaches us as SIGINT
        if self.is_running() {
            if let Err(e) = self.launcher.wait_for_ack(&self.running) {
                warn!(error = %e, "acknowledgment failed");
            }
        }
        if !self.is_running() {
            info!("interrupted while suspended");
            return Ok(());
        }

        self.resume()
    }

    fn resume(&mut self) -> Result<(), TickError> {
        self.screen.resume().map_err(TickError::Resume)?;
        self.mode = Mode::Dashboard(Canvas::new(self.area, Palette::standard()));
        info!("dashboard resumed");
        Ok(())
    }

    /// Sleep in short slices so an interrupt still ends the loop promptly.
    fn idle(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while self.is_running() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            std::thread::sleep(left.min(INTERRUPT_CHECK));
        }
    }
}

/// Take over the terminal and run the dashboard until quit or interrupt.
///
/// The terminal is restored before this returns, on every path.
pub fn run_tui(config: &DashboardConfig, running: Arc<AtomicBool>) -> anyhow::Result<ExitReason> {
    use anyhow::Context;

    let runner = SystemRunner::new(config.command_timeout())
        .context("failed to start the command runtime")?;
    let screen = CrosstermScreen::open().context("failed to initialize the terminal")?;

    let mut app = App::new(
        screen,
        ShellMetrics::new(runner),
        TtyLauncher,
        running,
        config.refresh_interval(),
    );
    Ok(app.run())
}
