use super::IncidentStore;
use crate::core::IncidentEvent;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends each incident as one JSON object per line.
///
/// Writes are blocking and run inline on the calling camera task. One short
/// append per incident is acceptable there; a slow or remote store should
/// offload its own I/O instead.
pub struct JsonlIncidentStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlIncidentStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open incident log {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IncidentStore for JsonlIncidentStore {
    fn persist(&self, incident: &IncidentEvent) -> Result<()> {
        let mut line = serde_json::to_string(incident).context("Failed to serialize incident")?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        file.flush()?;
        Ok(())
    }
}
