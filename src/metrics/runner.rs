//! Bounded execution of read-only status queries.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::debug;

use super::MetricsError;

/// Captured result of a query that ran to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
        }
    }

    #[cfg(test)]
    pub fn failed(stdout: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: stdout.into(),
        }
    }
}

/// Runs one external program and captures its stdout.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, MetricsError>;
}

/// Runs queries on the host with a hard time limit.
///
/// Owns a current-thread tokio runtime so the timeout can kill a stuck child
/// without spawning worker threads.
pub struct SystemRunner {
    runtime: Runtime,
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime, timeout })
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, MetricsError> {
        debug!(program, ?args, "running query");

        let output = self.runtime.block_on(async {
            let child = Command::new(program)
                .args(args)
                .env("LC_ALL", "C")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .output();
            tokio::time::timeout(self.timeout, child).await
        });

        match output {
            Err(_) => Err(MetricsError::TimedOut {
                program: program.to_string(),
                timeout: self.timeout,
            }),
            Ok(Err(source)) => Err(MetricsError::Spawn {
                program: program.to_string(),
                source,
            }),
            Ok(Ok(out)) => Ok(CommandOutput {
                success: out.status.success(),
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            }),
        }
    }
}
