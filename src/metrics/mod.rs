//! Host and orchestrator metrics for the dashboard.
//!
//! Every reading comes from a read-only external query (see [`probes`]) run
//! through a [`CommandRunner`]. A poll either yields a full snapshot or a
//! degraded one; partial snapshots are never produced.

pub mod probes;
pub mod runner;

use std::time::Duration;

use tracing::{debug, warn};

use probes::{CpuProbe, JobsProbe, MemoryProbe, OrchestratorProbe, Probe};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

/// Format used for the snapshot timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Health of the job orchestrator service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorStatus {
    Active,
    Inactive,
    Error,
}

impl OrchestratorStatus {
    pub fn is_active(self) -> bool {
        self == OrchestratorStatus::Active
    }
}

impl std::fmt::Display for OrchestratorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorStatus::Active => write!(f, "active"),
            OrchestratorStatus::Inactive => write!(f, "inactive"),
            OrchestratorStatus::Error => write!(f, "error"),
        }
    }
}

/// One reading of every tracked metric. Built once per tick, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsSnapshot {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub orchestrator: OrchestratorStatus,
    pub running_jobs: u32,
    pub timestamp: String,
    pub error_detail: Option<String>,
}

impl MetricsSnapshot {
    /// Snapshot shown when any metric could not be obtained.
    pub fn degraded(cause: impl Into<String>, timestamp: String) -> Self {
        Self {
            cpu_percent: 0.0,
            mem_percent: 0.0,
            orchestrator: OrchestratorStatus::Error,
            running_jobs: 0,
            timestamp,
            error_detail: Some(cause.into()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` did not finish within {}ms", .timeout.as_millis())]
    TimedOut { program: String, timeout: Duration },
    #[error("`{program}` exited unsuccessfully")]
    Failed { program: String },
    #[error("could not read {metric}: {detail}")]
    Parse {
        metric: &'static str,
        detail: String,
    },
}

impl MetricsError {
    pub(crate) fn parse(metric: &'static str, detail: impl Into<String>) -> Self {
        MetricsError::Parse {
            metric,
            detail: detail.into(),
        }
    }
}

/// Anything that can produce a snapshot. `poll` must not fail or panic on
/// environment errors; it degrades instead.
pub trait MetricsSource {
    fn poll(&mut self) -> MetricsSnapshot;
}

/// Metrics gathered by running the four probes through a command runner.
pub struct ShellMetrics<R> {
    runner: R,
    cpu: CpuProbe,
    memory: MemoryProbe,
    orchestrator: OrchestratorProbe,
    jobs: JobsProbe,
}

impl<R: CommandRunner> ShellMetrics<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            cpu: CpuProbe,
            memory: MemoryProbe,
            orchestrator: OrchestratorProbe::default(),
            jobs: JobsProbe,
        }
    }

    fn collect(&self, timestamp: String) -> Result<MetricsSnapshot, MetricsError> {
        let cpu_percent = self.cpu.read(&self.runner)?;
        let mem_percent = self.memory.read(&self.runner)?;
        let orchestrator = self.orchestrator.read(&self.runner)?;
        let running_jobs = self.jobs.read(&self.runner)?;

        Ok(MetricsSnapshot {
            cpu_percent,
            mem_percent,
            orchestrator,
            running_jobs,
            timestamp,
            error_detail: None,
        })
    }
}

impl<R: CommandRunner> MetricsSource for ShellMetrics<R> {
    fn poll(&mut self) -> MetricsSnapshot {
        let timestamp = now_timestamp();
        match self.collect(timestamp.clone()) {
            Ok(snapshot) => {
                debug!(
                    cpu = snapshot.cpu_percent,
                    mem = snapshot.mem_percent,
                    orchestrator = %snapshot.orchestrator,
                    jobs = snapshot.running_jobs,
                    "metrics polled"
                );
                snapshot
            }
            Err(e) => {
                warn!(error = %e, "metrics poll degraded");
                MetricsSnapshot::degraded(e.to_string(), timestamp)
            }
        }
    }
}

pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
