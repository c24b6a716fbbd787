//! Workspace folder resolution
//!
//! Every folder used by the controller lives under a single workspace root
//! and is created on first access.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SupervisorError};

/// Folder holding supervisord and program logs
pub const LOGS_FOLDER: &str = "logs";
/// Folder holding generated program configurations
pub const GENERATED_CONFIG_FOLDER: &str = "dumpedConfig/supervisor";
/// Folder holding the supervisord pid file
pub const PID_FOLDER: &str = "pid";
/// Folder holding the main supervisord configuration
pub const DUMPED_CONFIG_FOLDER: &str = "dumpedConfig";
/// Pid file written by supervisord
pub const PID_FILE_NAME: &str = "supervisord.pid";
/// Main supervisord configuration file name
pub const SUPERVISORD_CONFIG_NAME: &str = "supervisord.conf";

/// Mode applied to folders created on demand
const FOLDER_MODE: u32 = 0o777;

/// Resolves (and lazily creates) folders under a workspace root
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    /// Create a layout rooted at `root`; nothing is created yet
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `<root>/<name>`, creating it recursively if missing
    pub fn folder(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if !path.exists() {
            debug!("Creating workspace folder {:?}", path);
            create_folder(&path).map_err(|source| SupervisorError::Workspace {
                path: path.clone(),
                source,
            })?;
        }
        Ok(path)
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        self.folder(LOGS_FOLDER)
    }

    pub fn generated_config_dir(&self) -> Result<PathBuf> {
        self.folder(GENERATED_CONFIG_FOLDER)
    }

    pub fn pid_dir(&self) -> Result<PathBuf> {
        self.folder(PID_FOLDER)
    }

    /// Path of the supervisord pid file (the file itself is not created)
    pub fn pid_file(&self) -> Result<PathBuf> {
        Ok(self.pid_dir()?.join(PID_FILE_NAME))
    }

    /// Path of the main supervisord configuration (the file itself is not created)
    pub fn supervisord_config_file(&self) -> Result<PathBuf> {
        Ok(self.folder(DUMPED_CONFIG_FOLDER)?.join(SUPERVISORD_CONFIG_NAME))
    }
}

#[cfg(unix)]
fn create_folder(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(FOLDER_MODE)
        .create(path)
}

#[cfg(not(unix))]
fn create_folder(path: &Path) -> std::io::Result<()> {
    let _ = FOLDER_MODE;
    std::fs::create_dir_all(path)
}
