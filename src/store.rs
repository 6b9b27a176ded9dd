//! Artifact storage port
//!
//! Abstracts reading and atomically replacing the sysconfig files so the
//! engine core never touches `std::fs` directly. `LocalStore` is the
//! production implementation; `MemoryStore` backs tests and dry runs.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PortError, PortResult};

/// Abstract access to the configuration artifact files
pub trait ArtifactStore {
    /// Read an artifact; `Ok(None)` when the file does not exist
    fn read(&self, file: &Path) -> PortResult<Option<String>>;

    /// Replace an artifact's content atomically (a crash mid-write never
    /// leaves a half-written file)
    fn write_atomic(&self, file: &Path, content: &str) -> PortResult<()>;
}

/// Artifact store rooted at a configuration directory
///
/// Artifact names from the catalog are resolved against `root`, so tests
/// and non-root runs can point at any directory instead of
/// `/etc/sysconfig`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        self.root.join(file)
    }
}

impl ArtifactStore for LocalStore {
    fn read(&self, file: &Path) -> PortResult<Option<String>> {
        let path = self.resolve(file);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PortError::Io { file: path, source }),
        }
    }

    fn write_atomic(&self, file: &Path, content: &str) -> PortResult<()> {
        let path = self.resolve(file);
        let io_err = |source| PortError::Io {
            file: path.clone(),
            source,
        };

        let parent = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent).map_err(io_err)?;

        // tempfile in the same directory, then rename over the target
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.persist(&path)
            .map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// In-memory artifact store for tests and dry runs
///
/// Supports injecting a write failure on a chosen file, which is how the
/// partial-failure reporting of the persistence writer is exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
    fail_write_on: Mutex<Option<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an artifact file
    pub fn insert(&self, file: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.lock().unwrap().insert(file.into(), content.into());
    }

    /// Current content of an artifact file
    pub fn content(&self, file: &Path) -> Option<String> {
        self.files.lock().unwrap().get(file).cloned()
    }

    /// Make the next writes to `file` fail with a permission error
    pub fn fail_write_on(&self, file: impl Into<PathBuf>) {
        *self.fail_write_on.lock().unwrap() = Some(file.into());
    }

    /// Stop injecting write failures
    pub fn clear_write_failure(&self) {
        *self.fail_write_on.lock().unwrap() = None;
    }
}

impl ArtifactStore for MemoryStore {
    fn read(&self, file: &Path) -> PortResult<Option<String>> {
        Ok(self.files.lock().unwrap().get(file).cloned())
    }

    fn write_atomic(&self, file: &Path, content: &str) -> PortResult<()> {
        if self.fail_write_on.lock().unwrap().as_deref() == Some(file) {
            return Err(PortError::Io {
                file: file.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "injected failure"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(file.to_path_buf(), content.to_string());
        Ok(())
    }
}
