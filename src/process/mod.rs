//! Process control primitives
//!
//! Liveness probes and signal delivery sit behind [`ProcessController`] so the
//! OS mechanism can be swapped (shelling out, direct syscalls, test fakes).

pub mod command;
#[cfg(all(unix, feature = "nix"))]
pub mod native;
pub mod pid_file;

pub use command::CommandProcessController;
#[cfg(all(unix, feature = "nix"))]
pub use native::NixProcessController;
pub use pid_file::{parse_pid, read_pid};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SupervisorError};

/// Signal sent to the supervisor process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KillSignal {
    /// Plain `kill <pid>` (SIGTERM)
    #[default]
    Terminate,
    /// SIGHUP: supervisord reloads and restarts its children gracefully
    Hangup,
    /// SIGINT
    Interrupt,
    /// SIGQUIT
    Quit,
    /// SIGKILL: forced termination
    Kill,
    /// SIGUSR2: supervisord reopens its logs
    User2,
}

impl KillSignal {
    /// Signal name without the `SIG` prefix
    pub fn name(&self) -> &'static str {
        match self {
            KillSignal::Terminate => "TERM",
            KillSignal::Hangup => "HUP",
            KillSignal::Interrupt => "INT",
            KillSignal::Quit => "QUIT",
            KillSignal::Kill => "KILL",
            KillSignal::User2 => "USR2",
        }
    }

    /// Option passed to `kill`, `None` for the plain termination request
    pub fn kill_arg(&self) -> Option<String> {
        match self {
            KillSignal::Terminate => None,
            other => Some(format!("-{}", other.name())),
        }
    }

    /// Whether delivery is expected to end the process
    pub fn terminates(&self) -> bool {
        !matches!(self, KillSignal::Hangup | KillSignal::User2)
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG{}", self.name())
    }
}

impl FromStr for KillSignal {
    type Err = SupervisorError;

    /// Accepts `""` (plain termination) and names with or without `SIG`
    ///
    /// Only the signals supervisord reacts to are supported: TERM, HUP, INT,
    /// QUIT, KILL and USR2. Any other name (e.g. `USR1`) is rejected.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("SIG").unwrap_or(&upper);
        match name {
            "" | "TERM" => Ok(KillSignal::Terminate),
            "HUP" => Ok(KillSignal::Hangup),
            "INT" => Ok(KillSignal::Interrupt),
            "QUIT" => Ok(KillSignal::Quit),
            "KILL" => Ok(KillSignal::Kill),
            "USR2" => Ok(KillSignal::User2),
            _ => Err(SupervisorError::InvalidConfig(format!(
                "unsupported signal {:?}",
                s
            ))),
        }
    }
}

/// Command line delivering `signal` to `pid`: `kill [-SIG] <pid>`
pub fn kill_command(signal: KillSignal, pid: u32) -> Vec<String> {
    let mut command = vec!["kill".to_string()];
    command.extend(signal.kill_arg());
    command.push(pid.to_string());
    command
}

/// OS process control
#[async_trait]
pub trait ProcessController: Send + Sync {
    /// Whether a process with `pid` currently exists
    ///
    /// A process that vanished before or during the probe is reported as not
    /// alive, never as an error.
    async fn is_alive(&self, pid: u32) -> bool;

    /// Deliver `signal` to `pid`
    ///
    /// Delivery to a process that no longer exists is not reported as an error.
    async fn signal(&self, pid: u32, signal: KillSignal) -> Result<()>;
}

/// Default controller for the current platform
#[cfg(all(unix, feature = "nix"))]
pub fn default_controller() -> NixProcessController {
    NixProcessController::new()
}

/// Default controller for the current platform
#[cfg(not(all(unix, feature = "nix")))]
pub fn default_controller() -> CommandProcessController {
    CommandProcessController::new()
}
