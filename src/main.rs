mod config;
mod logging;
mod metrics;
mod tui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use config::DashboardConfig;
use metrics::{CommandRunner, MetricsError, MetricsSource, ShellMetrics, SystemRunner};
use tui::ExitReason;

#[derive(Parser)]
#[command(name = "oopuo-dash")]
#[command(
    about = "OOPUO Enterprise status dashboard: host load and Nomad health at a glance",
    long_about = None
)]
struct Cli {
    /// Config file (defaults to <config dir>/oopuo/dashboard.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Refresh interval in milliseconds (overrides config)
    #[arg(long)]
    refresh_ms: Option<u64>,
    /// Append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the tools the dashboard relies on and print one snapshot
    Doctor,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show config file path
    Path,
}

/// Tools queried by the dashboard, with an argument that makes each one exit
/// quickly.
const REQUIRED_TOOLS: [(&str, &str); 5] = [
    ("top", "-v"),
    ("free", "-V"),
    ("systemctl", "--version"),
    ("nomad", "version"),
    ("journalctl", "--version"),
];

fn resolve_config(cli: &Cli) -> Result<DashboardConfig, config::ConfigError> {
    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(ms) = cli.refresh_ms {
        cfg.refresh_interval_ms = ms;
    }
    if cli.log_file.is_some() {
        cfg.log_file = cli.log_file.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Config file `config path` reports. Never reads the file, so it still
/// answers when the file is broken.
fn config_path(cli: &Cli) -> Result<PathBuf, config::ConfigError> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => config::config_file_path(),
    }
}

/// One doctor line for `tool`.
fn check_tool(runner: &dyn CommandRunner, tool: &str, flag: &str) -> String {
    match runner.run(tool, &[flag]) {
        Ok(out) if out.success => format!("  ✓ {}", tool),
        Ok(_) => format!("  ✗ {} (exited unsuccessfully)", tool),
        Err(MetricsError::Spawn { source, .. }) => format!("  ✗ {} ({})", tool, source),
        Err(e) => format!("  ✗ {} ({})", tool, e),
    }
}

fn doctor(cfg: &DashboardConfig) -> anyhow::Result<()> {
    let runner = SystemRunner::new(cfg.command_timeout())?;

    println!("Doctor: checking dashboard dependencies...");
    for (tool, flag) in REQUIRED_TOOLS {
        println!("{}", check_tool(&runner, tool, flag));
    }

    let snapshot = ShellMetrics::new(runner).poll();
    println!("\nSnapshot at {}:", snapshot.timestamp);
    println!("  CPU:   {:5.1}%", snapshot.cpu_percent);
    println!("  MEM:   {:5.1}%", snapshot.mem_percent);
    println!("  Nomad: {}", snapshot.orchestrator);
    println!("  Jobs:  {} running", snapshot.running_jobs);
    if let Some(detail) = &snapshot.error_detail {
        println!("  Error: {}", detail);
    }
    Ok(())
}

fn install_interrupt_handler(running: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
}

fn main() {
    let cli = Cli::parse();

    if let Some(Commands::Config {
        cmd: ConfigCommands::Path,
    }) = &cli.command
    {
        match config_path(&cli) {
            Ok(file) => println!("{}", file.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let cfg = resolve_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = logging::init_logging(cli.verbose, cfg.log_file.as_deref()) {
        eprintln!("Error: failed to open log file: {}", e);
        std::process::exit(1);
    }

    match cli.command {
        // answered before the config was loaded
        Some(Commands::Config { .. }) => {}
        Some(Commands::Doctor) => {
            if let Err(e) = doctor(&cfg) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            let running = Arc::new(AtomicBool::new(true));
            if let Err(e) = install_interrupt_handler(running.clone()) {
                tracing::warn!(error = %e, "could not install signal handler");
            }

            match tui::run_tui(&cfg, running) {
                Ok(ExitReason::Interrupted) => println!("\nGoodbye!"),
                Ok(ExitReason::Quit) => {}
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
