//! Process control through direct system calls
//!
//! Uses `kill(pid, 0)` as the liveness probe and `kill(pid, sig)` for delivery
//! via the `nix` crate.

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::debug;

use crate::error::{Result, SupervisorError};
use crate::process::{KillSignal, ProcessController};

/// Signals and probes processes in-process
#[derive(Debug, Clone, Default)]
pub struct NixProcessController;

impl NixProcessController {
    pub fn new() -> Self {
        Self
    }
}

/// Convert to a positive `Pid`; values that would address process groups are rejected
fn to_pid(pid: u32) -> Option<Pid> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Some(Pid::from_raw(raw)),
        _ => None,
    }
}

fn to_signal(signal: KillSignal) -> Signal {
    match signal {
        KillSignal::Terminate => Signal::SIGTERM,
        KillSignal::Hangup => Signal::SIGHUP,
        KillSignal::Interrupt => Signal::SIGINT,
        KillSignal::Quit => Signal::SIGQUIT,
        KillSignal::Kill => Signal::SIGKILL,
        KillSignal::User2 => Signal::SIGUSR2,
    }
}

#[async_trait]
impl ProcessController for NixProcessController {
    async fn is_alive(&self, pid: u32) -> bool {
        let Some(target) = to_pid(pid) else {
            return false;
        };
        match kill(target, None) {
            Ok(()) => true,
            // The process exists but belongs to another user.
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    async fn signal(&self, pid: u32, signal: KillSignal) -> Result<()> {
        let target = to_pid(pid).ok_or_else(|| SupervisorError::Signal {
            pid,
            reason: "pid out of range".to_string(),
        })?;

        debug!("Sending {} to pid {}", signal, pid);
        match kill(target, to_signal(signal)) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!("Process {} already gone", pid);
                Ok(())
            }
            Err(e) => Err(SupervisorError::Signal {
                pid,
                reason: e.to_string(),
            }),
        }
    }
}
