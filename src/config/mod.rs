//! Configuration management for consumer-supervisor
//!
//! Handles configuration loading, validation, and environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::generator::{RestartPolicy, PROGRAM_TEMPLATE_ID};
use crate::utils::env::{env_int, env_opt};
use crate::worker::WorkerSet;

/// Overrides `workspace_dir`
pub const WORKSPACE_ENV: &str = "CONSUMER_SUPERVISOR_WORKSPACE";
/// Overrides `poll_interval_millis`
pub const POLL_MILLIS_ENV: &str = "CONSUMER_SUPERVISOR_POLL_MILLIS";

/// Defaults applied to every generated program configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDefaults {
    /// Command consuming a single queue
    #[serde(default = "default_consumer_command")]
    pub consumer_command: String,

    /// Command consuming several queues
    #[serde(default = "default_multiple_consumer_command")]
    pub multiple_consumer_command: String,

    /// Messages a consumer handles before exiting (`-m`)
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: u32,

    /// Processes per program
    #[serde(default = "default_numprocs")]
    pub numprocs: u32,

    /// Restart behavior
    #[serde(default)]
    pub restart_policy: RestartPolicy,

    /// Template the renderer uses
    #[serde(default = "default_template_id")]
    pub template_id: String,
}

fn default_consumer_command() -> String {
    "rabbitmq:consumer".to_string()
}

fn default_multiple_consumer_command() -> String {
    "rabbitmq:multiple-consumer".to_string()
}

fn default_prefetch_count() -> u32 {
    250
}

fn default_numprocs() -> u32 {
    1
}

fn default_template_id() -> String {
    PROGRAM_TEMPLATE_ID.to_string()
}

impl Default for ProgramDefaults {
    fn default() -> Self {
        Self {
            consumer_command: default_consumer_command(),
            multiple_consumer_command: default_multiple_consumer_command(),
            prefetch_count: default_prefetch_count(),
            numprocs: default_numprocs(),
            restart_policy: RestartPolicy::default(),
            template_id: default_template_id(),
        }
    }
}

/// supervisord command-line footprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// supervisord binary
    #[serde(default = "default_supervisord_bin")]
    pub supervisord_bin: String,

    /// supervisorctl binary
    #[serde(default = "default_supervisorctl_bin")]
    pub supervisorctl_bin: String,
}

fn default_supervisord_bin() -> String {
    "supervisord".to_string()
}

fn default_supervisorctl_bin() -> String {
    "supervisorctl".to_string()
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            supervisord_bin: default_supervisord_bin(),
            supervisorctl_bin: default_supervisorctl_bin(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "consumer_supervisor=debug")
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON instead of human-readable lines
    #[serde(default)]
    pub json_format: bool,
}

/// Supervisor controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Root of logs, generated configs and pid file
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    /// Application root handed to every program as its working directory
    #[serde(default = "default_kernel_root_dir")]
    pub kernel_root_dir: PathBuf,

    /// Single-queue consumers
    #[serde(default)]
    pub consumers: Vec<String>,

    /// Multi-queue consumers
    #[serde(default)]
    pub multiple_consumers: Vec<String>,

    #[serde(default)]
    pub program: ProgramDefaults,

    #[serde(default)]
    pub driver: DriverConfig,

    /// Liveness polling interval while waiting for supervisord to exit
    #[serde(default = "default_poll_interval_millis")]
    pub poll_interval_millis: u64,

    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("supervisor")
}

fn default_kernel_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_poll_interval_millis() -> u64 {
    1000
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
            kernel_root_dir: default_kernel_root_dir(),
            consumers: Vec::new(),
            multiple_consumers: Vec::new(),
            program: ProgramDefaults::default(),
            driver: DriverConfig::default(),
            poll_interval_millis: default_poll_interval_millis(),
            logging: None,
        }
    }
}

impl SupervisorConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(workspace) = env_opt(WORKSPACE_ENV) {
            self.workspace_dir = PathBuf::from(workspace);
        }
        if let Some(millis) = env_int::<u64>(POLL_MILLIS_ENV) {
            self.poll_interval_millis = millis;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    /// Declared workers as a validated set
    pub fn worker_set(&self) -> anyhow::Result<WorkerSet> {
        Ok(WorkerSet::from_names(
            self.consumers.iter().cloned(),
            self.multiple_consumers.iter().cloned(),
        )?)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workspace_dir.as_os_str().is_empty() {
            anyhow::bail!("workspace_dir must not be empty");
        }
        if self.poll_interval_millis == 0 {
            anyhow::bail!("poll_interval_millis must be greater than zero");
        }
        if self.program.numprocs == 0 {
            anyhow::bail!("program.numprocs must be greater than zero");
        }
        if self.program.consumer_command.trim().is_empty()
            || self.program.multiple_consumer_command.trim().is_empty()
        {
            anyhow::bail!("consumer commands must not be empty");
        }
        self.worker_set()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SupervisorError;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.program.prefetch_count, 250);
        assert_eq!(config.program.restart_policy.start_secs, 2);
        assert_eq!(config.program.restart_policy.stop_wait_secs, 60);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = SupervisorConfig::from_toml(
            r#"
            workspace_dir = "/var/run/app-supervisor"
            kernel_root_dir = "/srv/app"
            consumers = ["orders", "mail"]
            multiple_consumers = ["events"]

            [program]
            prefetch_count = 100

            [program.restart_policy]
            stop_wait_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.workspace_dir, PathBuf::from("/var/run/app-supervisor"));
        assert_eq!(config.program.prefetch_count, 100);
        assert_eq!(config.program.consumer_command, "rabbitmq:consumer");
        assert_eq!(config.program.restart_policy.stop_wait_secs, 30);
        assert!(config.program.restart_policy.auto_restart);
        assert_eq!(config.worker_set().unwrap().len(), 3);
    }

    #[test]
    fn test_validate_rejects_conflicting_workers() {
        let config = SupervisorConfig {
            consumers: vec!["orders".to_string()],
            multiple_consumers: vec!["orders".to_string()],
            ..SupervisorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SupervisorError>(),
            Some(SupervisorError::InvalidWorker(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let config = SupervisorConfig {
            poll_interval_millis: 0,
            ..SupervisorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("supervisor.json");
        let config = SupervisorConfig {
            consumers: vec!["orders".to_string()],
            ..SupervisorConfig::default()
        };

        config.to_json_file(&path).unwrap();
        assert_eq!(SupervisorConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var(WORKSPACE_ENV, "/tmp/override-ws");
        std::env::set_var(POLL_MILLIS_ENV, "25");

        let mut config = SupervisorConfig::default();
        config.apply_env_overrides();

        std::env::remove_var(WORKSPACE_ENV);
        std::env::remove_var(POLL_MILLIS_ENV);

        assert_eq!(config.workspace_dir, PathBuf::from("/tmp/override-ws"));
        assert_eq!(config.poll_interval(), Duration::from_millis(25));
    }

    #[test]
    #[serial]
    fn test_invalid_env_override_ignored() {
        std::env::set_var(POLL_MILLIS_ENV, "soon");

        let mut config = SupervisorConfig::default();
        config.apply_env_overrides();

        std::env::remove_var(POLL_MILLIS_ENV);

        assert_eq!(config.poll_interval_millis, 1000);
    }
}
