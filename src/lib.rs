//! Consumer Supervisor - supervisord control for queue consumer daemons
//!
//! This crate generates one supervisord program configuration per declared
//! consumer and drives the lifecycle of the supervisord instance that runs
//! them: build, rebuild, restart, start, stop, graceful reload (SIGHUP),
//! arbitrary signals and waiting for exit.
//!
//! ## Layout
//!
//! Everything lives under one workspace root:
//!
//! - `logs/` - supervisord and program logs
//! - `dumpedConfig/supervisor/*.conf` - generated program configurations
//! - `pid/supervisord.pid` - the supervisord pid file
//!
//! ## Design Principles
//!
//! 1. **No cached process state**: supervisor state is re-derived from the pid
//!    file and a liveness probe on every call
//! 2. **Full-replace generation**: every build removes stale configurations
//!    before writing new ones
//! 3. **Swappable OS boundary**: config storage, rendering, supervisor driving
//!    and process control are traits

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod generator;
pub mod process;
pub mod utils;
pub mod worker;
pub mod workspace;

pub use config::{DriverConfig, LoggingConfig, ProgramDefaults, SupervisorConfig};
pub use controller::{SupervisorController, SupervisorState, WaitOutcome};
pub use driver::{SupervisorDriver, SupervisordDriver};
pub use error::{Result, SupervisorError};
pub use generator::{
    ConfProgramRenderer, ConfigStore, FsConfigStore, MemoryConfigStore, ProgramFields,
    ProgramRenderer, RestartPolicy, RunConfiguration, WorkerConfigGenerator,
};
pub use process::{CommandProcessController, KillSignal, ProcessController};
#[cfg(all(unix, feature = "nix"))]
pub use process::NixProcessController;
pub use worker::{WorkerDescriptor, WorkerKind, WorkerSet};
pub use workspace::WorkspaceLayout;
