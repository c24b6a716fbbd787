//! supervisord / supervisorctl driver

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::driver::SupervisorDriver;
use crate::error::{Result, SupervisorError};
use crate::generator::CONFIG_EXTENSION;
use crate::workspace::WorkspaceLayout;

/// Control socket name, placed next to the pid file
const SOCKET_NAME: &str = "supervisord.sock";

/// Drives a supervisord daemon whose state lives in a workspace
pub struct SupervisordDriver {
    config: DriverConfig,
    layout: WorkspaceLayout,
}

impl SupervisordDriver {
    pub fn new(config: DriverConfig, layout: WorkspaceLayout) -> Self {
        Self { config, layout }
    }

    /// Main supervisord configuration for the workspace
    pub fn render_main_config(&self) -> Result<String> {
        let logs_dir = self.layout.logs_dir()?;
        let pid_dir = self.layout.pid_dir()?;
        let generated_dir = self.layout.generated_config_dir()?;
        let pid_file = self.layout.pid_file()?;
        let socket = pid_dir.join(SOCKET_NAME);

        Ok(format!(
            "[unix_http_server]\n\
             file={socket}\n\
             \n\
             [supervisord]\n\
             logfile={logs}/supervisord.log\n\
             pidfile={pid}\n\
             childlogdir={logs}\n\
             \n\
             [rpcinterface:supervisor]\n\
             supervisor.rpcinterface_factory = supervisor.rpcinterface:make_main_rpcinterface\n\
             \n\
             [supervisorctl]\n\
             serverurl=unix://{socket}\n\
             \n\
             [include]\n\
             files = {generated}/*.{ext}\n",
            socket = socket.display(),
            logs = logs_dir.display(),
            pid = pid_file.display(),
            generated = generated_dir.display(),
            ext = CONFIG_EXTENSION,
        ))
    }

    /// Write the main configuration and return its path
    pub fn write_main_config(&self) -> Result<PathBuf> {
        let path = self.layout.supervisord_config_file()?;
        let content = self.render_main_config()?;
        std::fs::write(&path, content).map_err(|source| SupervisorError::ConfigStore {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    async fn exec(&self, program: &str, args: &[&str]) -> Result<()> {
        let config_file = self.write_main_config()?;
        debug!("Running {} --configuration {:?} {:?}", program, config_file, args);

        let output = Command::new(program)
            .arg("--configuration")
            .arg(&config_file)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SupervisorError::Driver(format!("failed to run {}: {}", program, e)))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            info!("{}: {}", program, line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!("{}: {}", program, line);
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(SupervisorError::Driver(format!(
                "{} {:?} exited with {:?}",
                program,
                args,
                output.status.code()
            )))
        }
    }
}

#[async_trait]
impl SupervisorDriver for SupervisordDriver {
    async fn run(&self) -> Result<()> {
        info!("Starting supervisord");
        self.exec(&self.config.supervisord_bin, &[]).await
    }

    async fn reload_and_update(&self) -> Result<()> {
        info!("Reloading supervisord program configurations");
        self.exec(&self.config.supervisorctl_bin, &["reread"]).await?;
        self.exec(&self.config.supervisorctl_bin, &["update"]).await
    }
}
