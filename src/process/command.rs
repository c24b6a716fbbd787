//! Process control by shelling out to `ps` and `kill`

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, SupervisorError};
use crate::process::{kill_command, KillSignal, ProcessController};

/// Probes with `ps -p <pid>` and signals with `kill [-SIG] <pid>`
#[derive(Debug, Clone)]
pub struct CommandProcessController {
    ps_bin: String,
}

impl Default for CommandProcessController {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProcessController {
    pub fn new() -> Self {
        Self {
            ps_bin: "ps".to_string(),
        }
    }

    /// Use a different `ps` binary
    pub fn with_ps_bin(mut self, ps_bin: impl Into<String>) -> Self {
        self.ps_bin = ps_bin.into();
        self
    }
}

/// `ps` prints a header line, plus one line per matching process
fn ps_reports_process(stdout: &[u8]) -> bool {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count()
        > 1
}

#[async_trait]
impl ProcessController for CommandProcessController {
    async fn is_alive(&self, pid: u32) -> bool {
        let output = Command::new(&self.ps_bin)
            .arg("-p")
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                let alive = ps_reports_process(&output.stdout);
                debug!("ps probe for pid {}: alive={}", pid, alive);
                alive
            }
            Err(e) => {
                warn!("Failed to run {} for pid {}: {}", self.ps_bin, pid, e);
                false
            }
        }
    }

    async fn signal(&self, pid: u32, signal: KillSignal) -> Result<()> {
        let argv = kill_command(signal, pid);
        debug!("Running {:?}", argv);

        // Output goes straight to our stdio so operators see kill's own messages.
        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| SupervisorError::Signal {
                pid,
                reason: format!("failed to run kill: {}", e),
            })?;

        if !status.success() {
            // Usually the process exited between probe and signal.
            debug!("kill for pid {} exited with {:?}", pid, status.code());
        }
        Ok(())
    }
}
