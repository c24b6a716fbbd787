//! Supervisor lifecycle controller
//!
//! Drives one supervisord instance through build, rebuild, restart, start,
//! stop, graceful reload and signal delivery.
//!
//! The supervisor's state is never cached: every operation re-reads the pid
//! file and probes the process, so a reused pid can be mistaken for a live
//! supervisor. Callers must serialize lifecycle operations per workspace.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SupervisorConfig;
use crate::driver::{SupervisorDriver, SupervisordDriver};
use crate::error::Result;
use crate::generator::{
    ConfProgramRenderer, ConfigStore, FsConfigStore, RunConfiguration, WorkerConfigGenerator,
};
use crate::process::{self, read_pid, KillSignal, ProcessController};
use crate::worker::WorkerSet;
use crate::workspace::WorkspaceLayout;

/// Default liveness polling interval while waiting for exit
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Observed supervisor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisorState {
    /// No pid file, no usable pid, or the pid is not alive
    NotRunning,
    /// The pid file names a live process
    Running { pid: u32 },
}

impl SupervisorState {
    pub fn is_running(&self) -> bool {
        matches!(self, SupervisorState::Running { .. })
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            SupervisorState::Running { pid } => Some(*pid),
            SupervisorState::NotRunning => None,
        }
    }
}

/// How a wait for supervisor exit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// No pid was found, nothing to wait for
    NoProcess,
    /// The process is gone
    Exited,
    /// The deadline passed while the process was still alive
    TimedOut,
    /// The wait was cancelled while the process was still alive
    Cancelled,
}

/// Lifecycle controller for a supervisord instance and its workers
pub struct SupervisorController {
    layout: WorkspaceLayout,
    workers: WorkerSet,
    generator: WorkerConfigGenerator,
    driver: Arc<dyn SupervisorDriver>,
    processes: Arc<dyn ProcessController>,
    poll_interval: Duration,
}

impl SupervisorController {
    pub fn new(
        layout: WorkspaceLayout,
        workers: WorkerSet,
        generator: WorkerConfigGenerator,
        driver: Arc<dyn SupervisorDriver>,
        processes: Arc<dyn ProcessController>,
    ) -> Self {
        Self {
            layout,
            workers,
            generator,
            driver,
            processes,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the liveness polling interval used while waiting for exit
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Wire a controller against a real supervisord and the local filesystem
    pub fn from_config(config: &SupervisorConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let workers = config.worker_set()?;
        let layout = WorkspaceLayout::new(&config.workspace_dir);

        let store: Arc<dyn ConfigStore> =
            Arc::new(FsConfigStore::new(layout.generated_config_dir()?));
        let renderer = Arc::new(ConfProgramRenderer::new(Arc::clone(&store)));
        let generator = WorkerConfigGenerator::new(
            config.program.clone(),
            &config.kernel_root_dir,
            store,
            renderer,
        );
        let driver = Arc::new(SupervisordDriver::new(config.driver.clone(), layout.clone()));
        let processes = Arc::new(process::default_controller());

        Ok(Self::new(layout, workers, generator, driver, processes)
            .with_poll_interval(config.poll_interval()))
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn workers(&self) -> &WorkerSet {
        &self.workers
    }

    /// Resolve the supervisor state from the pid file and a liveness probe
    pub async fn status(&self) -> Result<SupervisorState> {
        let Some(pid) = read_pid(&self.layout.pid_dir()?) else {
            return Ok(SupervisorState::NotRunning);
        };
        if self.processes.is_alive(pid).await {
            Ok(SupervisorState::Running { pid })
        } else {
            debug!("Pid file names {} but the process is gone", pid);
            Ok(SupervisorState::NotRunning)
        }
    }

    /// Regenerate all program configurations, start supervisord if needed and
    /// make it apply the new configuration
    pub async fn build(&self) -> Result<Vec<RunConfiguration>> {
        info!("Building configuration for {} worker(s)", self.workers.len());
        let generated = self.generator.generate(&self.workers, &self.layout)?;

        // Reloading needs a live supervisord to talk to.
        self.start().await?;
        self.driver.reload_and_update().await?;
        Ok(generated)
    }

    /// Stop supervisord, then build
    pub async fn rebuild(&self) -> Result<Vec<RunConfiguration>> {
        self.stop().await?;
        self.build().await
    }

    /// Stop and start supervisord so every worker restarts
    pub async fn restart(&self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }

    /// Start supervisord unless it is already running
    pub async fn start(&self) -> Result<()> {
        if let SupervisorState::Running { pid } = self.status().await? {
            debug!("supervisord already running (pid {})", pid);
            return Ok(());
        }
        self.driver.run().await
    }

    /// Terminate supervisord and its workers and wait for it to exit
    pub async fn stop(&self) -> Result<()> {
        self.kill(KillSignal::Terminate, true).await
    }

    /// Send SIGHUP so supervisord gracefully restarts its workers; does not wait
    pub async fn hup(&self) -> Result<()> {
        self.kill(KillSignal::Hangup, false).await
    }

    /// Signal supervisord, optionally waiting for the signalled process to exit
    ///
    /// Does nothing when supervisord is not running.
    pub async fn kill(&self, signal: KillSignal, wait_for_exit: bool) -> Result<()> {
        let SupervisorState::Running { pid } = self.status().await? else {
            debug!("supervisord not running, not sending {}", signal);
            return Ok(());
        };

        info!("Sending {} to supervisord (pid {})", signal, pid);
        self.processes.signal(pid, signal).await?;

        if wait_for_exit {
            self.wait_for_pid(pid, None).await;
        }
        Ok(())
    }

    /// Block until the supervisor named by the pid file is gone
    ///
    /// Unbounded: a supervisor that never exits blocks forever. Use
    /// [`wait_timeout`](Self::wait_timeout) or
    /// [`wait_cancellable`](Self::wait_cancellable) to bound it.
    pub async fn wait(&self) -> Result<WaitOutcome> {
        match read_pid(&self.layout.pid_dir()?) {
            Some(pid) => Ok(self.wait_for_pid(pid, None).await),
            None => Ok(WaitOutcome::NoProcess),
        }
    }

    /// [`wait`](Self::wait) with a deadline
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<WaitOutcome> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(WaitOutcome::TimedOut),
        }
    }

    /// [`wait`](Self::wait) that ends early when `cancel` fires
    pub async fn wait_cancellable(&self, cancel: &CancellationToken) -> Result<WaitOutcome> {
        match read_pid(&self.layout.pid_dir()?) {
            Some(pid) => Ok(self.wait_for_pid(pid, Some(cancel)).await),
            None => Ok(WaitOutcome::NoProcess),
        }
    }

    async fn wait_for_pid(&self, pid: u32, cancel: Option<&CancellationToken>) -> WaitOutcome {
        debug!("Waiting for pid {} to exit", pid);
        loop {
            if !self.processes.is_alive(pid).await {
                info!("supervisord (pid {}) has exited", pid);
                return WaitOutcome::Exited;
            }
            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return WaitOutcome::Cancelled,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}
