use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{KeyValueStore, StoreError};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Suffix of the scratch file a write goes to before it is renamed into place
const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntries {
    entries: BTreeMap<String, String>,
    updated_at: DateTime<Utc>,
}

/// Key-value store persisted as a single JSON file.
///
/// The file is re-read on every access so changes made by another process
/// (e.g. a second CLI invocation) are picked up. It is deleted once the last
/// entry is removed.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Store backed by `session.json` inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(SESSION_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the file was last written, if it exists.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read().map(|s| s.updated_at)
    }

    /// Short relative age of the stored session ("just now", "5m ago", "2h ago", "3d ago").
    pub fn age_display(&self) -> Option<String> {
        self.updated_at().map(|t| age_display(Utc::now() - t))
    }

    fn read(&self) -> Option<StoredEntries> {
        if !self.path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read session file");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to parse session file");
                None
            }
        }
    }

    fn write(&self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
                debug!(path = ?self.path, "Session file removed");
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredEntries {
            entries,
            updated_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;

        // Readers see either the old file or the new one, never a partial write
        let temp = self.path.with_extension(TEMP_SUFFIX);
        std::fs::write(&temp, contents)?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read().and_then(|mut s| s.entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read().map(|s| s.entries).unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write(entries)
    }

    fn set_many(&self, values: &[(&str, &str)]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read().map(|s| s.entries).unwrap_or_default();
        for (key, value) in values {
            entries.insert(key.to_string(), value.to_string());
        }
        self.write(entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let Some(stored) = self.read() else {
            return Ok(());
        };
        let mut entries = stored.entries;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write(entries)
    }
}

fn age_display(age: chrono::Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}
