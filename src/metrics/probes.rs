//! One adapter per metric. Each runs a single query and parses its text.

use super::runner::CommandRunner;
use super::{MetricsError, OrchestratorStatus};

/// Service unit of the job orchestrator.
pub const ORCHESTRATOR_UNIT: &str = "nomad";

pub trait Probe {
    type Reading;

    fn read(&self, runner: &dyn CommandRunner) -> Result<Self::Reading, MetricsError>;
}

/// Instantaneous CPU utilization from a single `top` iteration.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuProbe;

impl Probe for CpuProbe {
    type Reading = f64;

    fn read(&self, runner: &dyn CommandRunner) -> Result<f64, MetricsError> {
        let out = runner.run("top", &["-bn1"])?;
        if !out.success {
            return Err(MetricsError::Failed {
                program: "top".to_string(),
            });
        }
        parse_cpu_percent(&out.stdout)
    }
}

/// Parse the `Cpu(s)` summary line of `top -bn1`.
///
/// Utilization is `100 - idle`; older `top` builds that omit the idle field
/// fall back to the user share.
pub fn parse_cpu_percent(text: &str) -> Result<f64, MetricsError> {
    let line = text
        .lines()
        .find(|l| l.contains("Cpu(s)"))
        .ok_or_else(|| MetricsError::parse("cpu", "no Cpu(s) line in top output"))?;

    let fields = line
        .split_once(':')
        .map(|(_, rest)| rest)
        .ok_or_else(|| MetricsError::parse("cpu", format!("malformed line: {line}")))?;

    let mut user = None;
    let mut idle = None;
    for field in fields.split(',') {
        // "6.2 us" on procps-ng, "6.2%us" on older builds
        let field = field.trim();
        let split = field
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(field.len());
        let (value, label) = field.split_at(split);
        let slot = match label.trim_start_matches(['%', ' ']) {
            "us" => &mut user,
            "id" => &mut idle,
            _ => continue,
        };
        *slot = Some(
            value
                .parse::<f64>()
                .map_err(|_| MetricsError::parse("cpu", format!("bad number `{value}`")))?,
        );
    }

    let busy = match (idle, user) {
        (Some(idle), _) => 100.0 - idle,
        (None, Some(user)) => user,
        (None, None) => {
            return Err(MetricsError::parse("cpu", format!("no usage fields: {line}")));
        }
    };
    Ok(round_tenth(busy.clamp(0.0, 100.0)))
}

/// Share of physical memory in use, from `free`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryProbe;

impl Probe for MemoryProbe {
    type Reading = f64;

    fn read(&self, runner: &dyn CommandRunner) -> Result<f64, MetricsError> {
        let out = runner.run("free", &[])?;
        if !out.success {
            return Err(MetricsError::Failed {
                program: "free".to_string(),
            });
        }
        parse_mem_percent(&out.stdout)
    }
}

pub fn parse_mem_percent(text: &str) -> Result<f64, MetricsError> {
    let row = text
        .lines()
        .find(|l| l.trim_start().starts_with("Mem:"))
        .ok_or_else(|| MetricsError::parse("memory", "no Mem: row in free output"))?;

    let mut columns = row.split_whitespace().skip(1);
    let mut next = |name: &str| -> Result<f64, MetricsError> {
        columns
            .next()
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| MetricsError::parse("memory", format!("missing {name} column")))
    };
    let total = next("total")?;
    let used = next("used")?;

    if total <= 0.0 {
        return Err(MetricsError::parse("memory", "total memory is zero"));
    }
    Ok(round_tenth(used / total * 100.0))
}

/// Orchestrator service health via `systemctl is-active`.
#[derive(Clone, Copy, Debug)]
pub struct OrchestratorProbe {
    pub unit: &'static str,
}

impl Default for OrchestratorProbe {
    fn default() -> Self {
        Self {
            unit: ORCHESTRATOR_UNIT,
        }
    }
}

impl Probe for OrchestratorProbe {
    type Reading = OrchestratorStatus;

    fn read(&self, runner: &dyn CommandRunner) -> Result<OrchestratorStatus, MetricsError> {
        match runner.run("systemctl", &["is-active", self.unit]) {
            Ok(out) if out.success => Ok(parse_service_state(&out.stdout)),
            // is-active exits non-zero for every state but "active"
            Ok(_) | Err(MetricsError::Spawn { .. }) => Ok(OrchestratorStatus::Inactive),
            Err(e) => Err(e),
        }
    }
}

pub fn parse_service_state(text: &str) -> OrchestratorStatus {
    match text.lines().next().map(str::trim) {
        Some("active") => OrchestratorStatus::Active,
        _ => OrchestratorStatus::Inactive,
    }
}

/// Number of jobs the orchestrator reports as running.
#[derive(Clone, Copy, Debug, Default)]
pub struct JobsProbe;

impl Probe for JobsProbe {
    type Reading = u32;

    fn read(&self, runner: &dyn CommandRunner) -> Result<u32, MetricsError> {
        match runner.run("nomad", &["job", "status"]) {
            Ok(out) if out.success => Ok(count_running_jobs(&out.stdout)),
            // no CLI or no reachable agent: nothing is running as far as we can tell
            Ok(_) | Err(MetricsError::Spawn { .. }) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

/// Count rows of the `nomad job status` table whose Status column is `running`.
pub fn count_running_jobs(text: &str) -> u32 {
    text.lines()
        .filter(|l| !l.trim_start().starts_with("ID "))
        .filter(|l| l.split_whitespace().nth(3) == Some("running"))
        .count() as u32
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
