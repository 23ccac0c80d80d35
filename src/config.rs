use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MIN_REFRESH_INTERVAL_MS: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub refresh_interval_ms: u64,
    /// Upper bound for each metric query.
    pub command_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            command_timeout_ms: 3000,
            log_file: None,
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "refresh_interval_ms must be at least {MIN_REFRESH_INTERVAL_MS}, got {}",
                self.refresh_interval_ms
            )));
        }
        if self.command_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "command_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|p| p.join("oopuo"))
        .ok_or(ConfigError::NoConfigDir)
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    config_dir().map(|dir| dir.join("dashboard.toml"))
}

/// Load the config at `path`, or the default location when `None`.
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig, ConfigError> {
    let file = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if !file.exists() {
        return Ok(DashboardConfig::default());
    }
    let content = fs::read_to_string(&file).map_err(|source| ConfigError::Read {
        path: file.clone(),
        source,
    })?;
    parse_config(&content).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse { path: file, source },
        other => other,
    })
}

pub fn parse_config(content: &str) -> Result<DashboardConfig, ConfigError> {
    let config: DashboardConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: PathBuf::new(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(1));
        assert_eq!(cfg.command_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let cfg =
            parse_config("command_timeout_ms = 1500\nlog_file = \"/tmp/dash.log\"\n").unwrap();
        assert_eq!(cfg.refresh_interval_ms, 1000);
        assert_eq!(cfg.command_timeout_ms, 1500);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/dash.log")));
    }

    #[test]
    fn too_fast_refresh_is_rejected() {
        let err = parse_config("refresh_interval_ms = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(parse_config("command_timeout_ms = 0").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config("refresh = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("oopuo-dash-does-not-exist.toml");
        assert_eq!(load_config(Some(&path)).unwrap(), DashboardConfig::default());
    }

    #[test]
    fn load_reads_file_and_reports_path_on_error() {
        let dir = std::env::temp_dir().join(format!("oopuo-dash-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.toml");
        fs::write(&good, "refresh_interval_ms = 2000\n").unwrap();
        assert_eq!(load_config(Some(&good)).unwrap().refresh_interval_ms, 2000);

        let bad = dir.join("bad.toml");
        fs::write(&bad, "refresh_interval_ms = \"fast\"\n").unwrap();
        let msg = load_config(Some(&bad)).unwrap_err().to_string();
        assert!(msg.contains("bad.toml"), "{msg}");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn toml_round_trip() {
        let cfg = DashboardConfig {
            refresh_interval_ms: 500,
            ..DashboardConfig::default()
        };
        let serialized = toml::to_string(&cfg).unwrap();
        let deserialized: DashboardConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized, cfg);
    }

    #[test]
    fn config_path_ends_in_dashboard_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("oopuo/dashboard.toml"));
        }
    }
}
