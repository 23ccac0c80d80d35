//! Tracing setup. The dashboard owns the terminal, so log lines go to a file
//! or nowhere.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILE_ENV: &str = "OOPUO_LOG_FILE";

/// Filter from `RUST_LOG`, else `debug` with `--verbose`, else `info`.
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "oopuo_dash=debug,info"
        } else {
            "info"
        })
    })
}

pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = build_filter(verbose);
    let env_file = std::env::var_os(LOG_FILE_ENV);
    let target = log_file.or(env_file.as_deref().map(Path::new));

    match target {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .try_init();
        }
    }
    Ok(())
}
