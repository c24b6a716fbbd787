//! Worker run-configuration generation
//!
//! Every build regenerates the full set of program configurations: stale
//! generated files are removed first, then one configuration per declared
//! worker is rendered.

pub mod renderer;
pub mod store;

pub use renderer::{ConfProgramRenderer, ProgramRenderer, PROGRAM_TEMPLATE_ID};
pub use store::{ConfigStore, FsConfigStore, MemoryConfigStore, CONFIG_EXTENSION};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ProgramDefaults;
use crate::error::Result;
use crate::worker::{WorkerDescriptor, WorkerKind, WorkerSet};
use crate::workspace::WorkspaceLayout;

/// Restart behavior supervisord applies to a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Signal the whole process group on stop
    #[serde(default = "default_true")]
    pub stop_as_group: bool,

    /// Restart the worker whenever it exits
    #[serde(default = "default_true")]
    pub auto_restart: bool,

    /// Seconds a worker must stay up to count as started
    #[serde(default = "default_start_secs")]
    pub start_secs: u32,

    /// Seconds supervisord waits after the stop signal before SIGKILL
    #[serde(default = "default_stop_wait_secs")]
    pub stop_wait_secs: u32,
}

fn default_true() -> bool {
    true
}

fn default_start_secs() -> u32 {
    2
}

fn default_stop_wait_secs() -> u32 {
    60
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            stop_as_group: true,
            auto_restart: true,
            start_secs: default_start_secs(),
            stop_wait_secs: default_stop_wait_secs(),
        }
    }
}

impl RestartPolicy {
    /// Supervisord option keys and values for this policy
    pub fn to_options(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("stopasgroup".to_string(), self.stop_as_group.to_string()),
            ("autorestart".to_string(), self.auto_restart.to_string()),
            ("startsecs".to_string(), self.start_secs.to_string()),
            ("stopwaitsecs".to_string(), self.stop_wait_secs.to_string()),
        ])
    }
}

/// Run configuration derived from a worker descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    pub worker_name: String,
    pub kind: WorkerKind,
    /// Full invocation, e.g. `rabbitmq:consumer -m 250 orders`
    pub command: String,
    pub numprocs: u32,
    pub restart_policy: RestartPolicy,
}

impl RunConfiguration {
    /// Fields handed to the program renderer
    pub fn fields(&self, kernel_root_dir: &Path, logs_dir: &Path) -> ProgramFields {
        ProgramFields {
            name: self.worker_name.clone(),
            command: self.command.clone(),
            kernel_root_dir: kernel_root_dir.to_path_buf(),
            logs_dir: logs_dir.to_path_buf(),
            numprocs: self.numprocs,
            options: self.restart_policy.to_options(),
        }
    }
}

/// Template fields for one program configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramFields {
    pub name: String,
    pub command: String,
    pub kernel_root_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub numprocs: u32,
    pub options: BTreeMap<String, String>,
}

/// Generates program configurations for all declared workers
pub struct WorkerConfigGenerator {
    defaults: ProgramDefaults,
    kernel_root_dir: PathBuf,
    store: Arc<dyn ConfigStore>,
    renderer: Arc<dyn ProgramRenderer>,
}

impl WorkerConfigGenerator {
    pub fn new<P: AsRef<Path>>(
        defaults: ProgramDefaults,
        kernel_root_dir: P,
        store: Arc<dyn ConfigStore>,
        renderer: Arc<dyn ProgramRenderer>,
    ) -> Self {
        Self {
            defaults,
            kernel_root_dir: kernel_root_dir.as_ref().to_path_buf(),
            store,
            renderer,
        }
    }

    pub fn defaults(&self) -> &ProgramDefaults {
        &self.defaults
    }

    /// Derive the run configuration for one worker
    pub fn run_configuration(&self, worker: &WorkerDescriptor) -> RunConfiguration {
        let consumer_command = match worker.kind {
            WorkerKind::Single => &self.defaults.consumer_command,
            WorkerKind::Multiple => &self.defaults.multiple_consumer_command,
        };
        RunConfiguration {
            worker_name: worker.name.clone(),
            kind: worker.kind,
            command: format!(
                "{} -m {} {}",
                consumer_command, self.defaults.prefetch_count, worker.name
            ),
            numprocs: self.defaults.numprocs,
            restart_policy: self.defaults.restart_policy,
        }
    }

    /// Replace all generated configurations with one per worker in `workers`
    ///
    /// Stops at the first I/O failure; files already removed or written stay
    /// that way.
    pub fn generate(
        &self,
        workers: &WorkerSet,
        layout: &WorkspaceLayout,
    ) -> Result<Vec<RunConfiguration>> {
        let logs_dir = layout.logs_dir()?;
        let generated_dir = layout.generated_config_dir()?;

        let stale = self.store.list_generated()?;
        debug!(
            "Removing {} stale configuration(s) from {:?}",
            stale.len(),
            generated_dir
        );
        for name in &stale {
            self.store.delete(name)?;
        }

        let mut generated = Vec::with_capacity(workers.len());
        for worker in workers.descriptors() {
            let run_config = self.run_configuration(&worker);
            let fields = run_config.fields(&self.kernel_root_dir, &logs_dir);
            self.renderer.generate_program_config(
                &worker.name,
                &fields,
                &self.defaults.template_id,
            )?;
            generated.push(run_config);
        }

        info!(
            "Generated {} program configuration(s) in {:?}",
            generated.len(),
            generated_dir
        );
        Ok(generated)
    }
}
