//! Storage for generated program configurations
//!
//! The generated configuration directory is shared, mutable state. Access goes
//! through [`ConfigStore`] so tests can assert exact file sets without disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{Result, SupervisorError};

/// Extension of generated program configuration files
pub const CONFIG_EXTENSION: &str = "conf";

/// Storage for generated configuration files
pub trait ConfigStore: Send + Sync {
    /// Names of generated configuration files (non-directories ending in `.conf`)
    fn list_generated(&self) -> Result<Vec<String>>;

    /// Delete a generated file by name
    fn delete(&self, name: &str) -> Result<()>;

    /// Write (create or replace) a file by name
    fn write(&self, name: &str, content: &str) -> Result<()>;
}

/// Whether `name` carries the generated configuration extension
pub fn is_generated_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext == CONFIG_EXTENSION)
        .unwrap_or(false)
}

/// Config store backed by a directory
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    dir: PathBuf,
}

impl FsConfigStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_error(&self, path: PathBuf) -> impl FnOnce(std::io::Error) -> SupervisorError {
        move |source| SupervisorError::ConfigStore { path, source }
    }
}

impl ConfigStore for FsConfigStore {
    fn list_generated(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(self.io_error(self.dir.clone()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(self.io_error(self.dir.clone()))?;
            // Follows symlinks; a dangling link is not a directory.
            if entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_generated_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.dir.join(name);
        debug!("Removing generated configuration {:?}", path);
        std::fs::remove_file(&path).map_err(self.io_error(path.clone()))
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.dir.join(name);
        debug!("Writing configuration {:?}", path);
        std::fs::write(&path, content).map_err(self.io_error(path.clone()))
    }
}

/// In-memory config store
///
/// Directories are not modelled; every stored entry is a file.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored files
    pub fn files(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still consistent: each operation is a single insert or remove.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn list_generated(&self) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .keys()
            .filter(|name| is_generated_name(name))
            .cloned()
            .collect())
    }

    fn delete(&self, name: &str) -> Result<()> {
        match self.lock().remove(name) {
            Some(_) => Ok(()),
            None => Err(SupervisorError::ConfigStore {
                path: PathBuf::from(name),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        self.lock().insert(name.to_string(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_generated_name() {
        assert!(is_generated_name("orders.conf"));
        assert!(!is_generated_name("keep.txt"));
        assert!(!is_generated_name("conf"));
        assert!(!is_generated_name("orders.conf.bak"));
    }

    #[test]
    fn test_fs_store_skips_directories_and_other_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("old.conf"), "x").unwrap();
        std::fs::write(temp_dir.path().join("keep.txt"), "x").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested.conf")).unwrap();

        let store = FsConfigStore::new(temp_dir.path());
        assert_eq!(store.list_generated().unwrap(), vec!["old.conf".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_store_skips_symlinked_directories() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("real_dir")).unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("real_dir"),
            temp_dir.path().join("linked.conf"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("missing_target"),
            temp_dir.path().join("dangling.conf"),
        )
        .unwrap();

        let store = FsConfigStore::new(temp_dir.path());
        assert_eq!(
            store.list_generated().unwrap(),
            vec!["dangling.conf".to_string()]
        );

        store.delete("dangling.conf").unwrap();
        assert!(temp_dir.path().join("linked.conf").is_dir());
    }

    #[test]
    fn test_fs_store_write_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsConfigStore::new(temp_dir.path());

        store.write("a.conf", "content").unwrap();
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("a.conf")).unwrap(),
            "content"
        );

        store.delete("a.conf").unwrap();
        assert!(!temp_dir.path().join("a.conf").exists());
        assert!(store.delete("a.conf").is_err());
    }

    #[test]
    fn test_fs_store_missing_dir_errors() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsConfigStore::new(temp_dir.path().join("missing"));
        assert!(matches!(
            store.list_generated(),
            Err(SupervisorError::ConfigStore { .. })
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryConfigStore::new();
        store.write("a.conf", "1").unwrap();
        store.write("notes.txt", "2").unwrap();

        assert_eq!(store.list_generated().unwrap(), vec!["a.conf".to_string()]);
        store.delete("a.conf").unwrap();
        assert!(store.get("a.conf").is_none());
        assert_eq!(store.get("notes.txt").as_deref(), Some("2"));
    }
}
