//! Small JSON record store backing the client's persistent state.
//!
//! Each record lives in its own `<name>.json` file inside the state
//! directory, wrapped with the time it was written. Writes go to a
//! temporary file first and are renamed into place, so a reader never
//! observes a half-written record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stored<T> {
    pub data: T,
    pub saved_at: DateTime<Utc>,
}

impl<T> Stored<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            saved_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }
}

#[derive(Debug, Clone)]
pub struct StateDir {
    dir: PathBuf,
}

impl StateDir {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<Stored<T>>> {
        let path = self.record_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file: {}", name))?;

        let stored: Stored<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", name))?;

        Ok(Some(stored))
    }

    pub fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let stored = Stored::new(data);
        let path = self.record_path(name);
        let tmp = self.dir.join(format!(".{}.json.tmp", name));
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write state file: {}", name))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace state file: {}", name))?;
        debug!(record = name, "State saved");
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.record_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove state file: {}", name))?;
            debug!(record = name, "State removed");
        }
        Ok(())
    }
}
