use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Encoded export ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Where finished exports go: a download, a directory, a test buffer.
pub trait FileSink: Send + Sync {
    fn save(&self, payload: &ExportPayload) -> Result<()>;
}

/// Saves exports into a directory. Data is staged in a hidden partial file
/// and renamed into place; the partial file never outlives a failed save.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for a payload; only the final path segment of its name is used.
    pub fn target_path(&self, file_name: &str) -> PathBuf {
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        self.dir.join(name)
    }
}

impl FileSink for DirectorySink {
    fn save(&self, payload: &ExportPayload) -> Result<()> {
        let target = self.target_path(&payload.file_name);
        let partial = PartialFile::new(&target);

        fs::write(&partial.path, &payload.bytes)?;
        fs::rename(&partial.path, &target)?;
        partial.commit();

        debug!(
            path = %target.display(),
            mime_type = payload.mime_type,
            bytes = payload.bytes.len(),
            "Saved export"
        );
        Ok(())
    }
}

struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: target.with_file_name(format!(".{name}.part")),
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed || !self.path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove partial export");
        }
    }
}

/// Keeps every saved payload in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<ExportPayload>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<ExportPayload> {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl FileSink for MemorySink {
    fn save(&self, payload: &ExportPayload) -> Result<()> {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(payload.clone());
        Ok(())
    }
}
