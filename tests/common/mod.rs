//! Shared fakes for controller tests

#![allow(dead_code)]

use async_trait::async_trait;
use consumer_supervisor::generator::{ConfProgramRenderer, MemoryConfigStore};
use consumer_supervisor::{
    ConfigStore, KillSignal, ProcessController, ProgramDefaults, Result, SupervisorController,
    SupervisorDriver, SupervisorError, WorkerConfigGenerator, WorkerSet, WorkspaceLayout,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Ordered record of driver and process interactions
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Process table kept in memory
///
/// Terminating signals remove the pid, optionally after `exit_delay`.
pub struct FakeProcesses {
    alive: Arc<Mutex<HashSet<u32>>>,
    log: CallLog,
    exit_delay: Option<Duration>,
}

impl FakeProcesses {
    pub fn new(log: CallLog) -> Self {
        Self {
            alive: Arc::new(Mutex::new(HashSet::new())),
            log,
            exit_delay: None,
        }
    }

    pub fn with_exit_delay(mut self, delay: Duration) -> Self {
        self.exit_delay = Some(delay);
        self
    }

    pub fn spawn(&self, pid: u32) {
        self.alive.lock().unwrap().insert(pid);
    }

    pub fn exit(&self, pid: u32) {
        self.alive.lock().unwrap().remove(&pid);
    }

    pub fn alive_pids(&self) -> HashSet<u32> {
        self.alive.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessController for FakeProcesses {
    async fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }

    async fn signal(&self, pid: u32, signal: KillSignal) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("signal {} {}", signal.name(), pid));
        if signal.terminates() {
            match self.exit_delay {
                Some(delay) => {
                    let alive = Arc::clone(&self.alive);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        alive.lock().unwrap().remove(&pid);
                    });
                }
                None => {
                    self.alive.lock().unwrap().remove(&pid);
                }
            }
        }
        Ok(())
    }
}

/// Driver that "starts" supervisord by writing a pid file and registering
/// the pid with [`FakeProcesses`]
pub struct FakeDriver {
    pid_file: PathBuf,
    processes: Arc<FakeProcesses>,
    next_pid: Mutex<u32>,
    log: CallLog,
}

impl FakeDriver {
    pub fn new(layout: &WorkspaceLayout, processes: Arc<FakeProcesses>, log: CallLog) -> Self {
        Self {
            pid_file: layout.pid_file().unwrap(),
            processes,
            next_pid: Mutex::new(1000),
            log,
        }
    }

    fn current_pid(&self) -> Option<u32> {
        let content = std::fs::read_to_string(&self.pid_file).ok()?;
        content.trim().parse().ok()
    }
}

#[async_trait]
impl SupervisorDriver for FakeDriver {
    async fn run(&self) -> Result<()> {
        let pid = {
            let mut next = self.next_pid.lock().unwrap();
            *next += 1;
            *next
        };
        std::fs::write(&self.pid_file, format!("{}\n", pid)).unwrap();
        self.processes.spawn(pid);
        self.log.lock().unwrap().push(format!("run {}", pid));
        Ok(())
    }

    async fn reload_and_update(&self) -> Result<()> {
        match self.current_pid() {
            Some(pid) if self.processes.alive_pids().contains(&pid) => {
                self.log.lock().unwrap().push(format!("reload {}", pid));
                Ok(())
            }
            _ => Err(SupervisorError::Driver("supervisord is not running".to_string())),
        }
    }
}

/// Controller wired to fakes over a temporary workspace
pub struct Harness {
    pub temp_dir: TempDir,
    pub layout: WorkspaceLayout,
    pub store: Arc<MemoryConfigStore>,
    pub processes: Arc<FakeProcesses>,
    pub log: CallLog,
    pub controller: SupervisorController,
}

impl Harness {
    pub fn new(workers: WorkerSet) -> Self {
        Self::with_processes(workers, FakeProcesses::new)
    }

    pub fn with_processes<F>(workers: WorkerSet, make_processes: F) -> Self
    where
        F: FnOnce(CallLog) -> FakeProcesses,
    {
        let temp_dir = TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(temp_dir.path());
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let processes = Arc::new(make_processes(Arc::clone(&log)));
        let store = Arc::new(MemoryConfigStore::new());

        let store_dyn: Arc<dyn ConfigStore> = store.clone();
        let renderer = Arc::new(ConfProgramRenderer::new(Arc::clone(&store_dyn)));
        let generator =
            WorkerConfigGenerator::new(ProgramDefaults::default(), "/srv/app", store_dyn, renderer);
        let driver = Arc::new(FakeDriver::new(&layout, Arc::clone(&processes), Arc::clone(&log)));

        let controller = SupervisorController::new(
            layout.clone(),
            workers,
            generator,
            driver,
            processes.clone(),
        )
        .with_poll_interval(Duration::from_millis(10));

        Self {
            temp_dir,
            layout,
            store,
            processes,
            log,
            controller,
        }
    }

    pub fn write_pid_file(&self, content: &str) {
        std::fs::write(self.layout.pid_file().unwrap(), content).unwrap();
    }
}

pub fn workers(singles: &[&str], multiples: &[&str]) -> WorkerSet {
    WorkerSet::from_names(singles.iter().copied(), multiples.iter().copied()).unwrap()
}
