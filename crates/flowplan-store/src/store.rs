use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::models::AppState;

/// Collection holding [`crate::models::Goal`] records.
pub const GOALS: &str = "goals";
/// Collection holding [`crate::models::Task`] records.
pub const TASKS: &str = "tasks";
/// Collection holding [`crate::models::Event`] records.
pub const EVENTS: &str = "events";

/// Three keyed JSON collections in a data directory.
///
/// Collections are read whole and rewritten whole; there is no partial
/// update. Writes go to a temporary sibling file that is renamed over the
/// original so a crash never leaves a truncated collection behind.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    /// Open the store, creating the data directory if necessary.
    pub fn open(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "failed to create data directory {}",
                config.data_dir.display()
            )
        })?;
        debug!(dir = %config.data_dir.display(), "store opened");
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Read all three collections.
    ///
    /// A collection that is absent or does not parse loads as empty.
    pub fn load(&self) -> AppState {
        AppState {
            goals: self.read_collection(GOALS),
            tasks: self.read_collection(TASKS),
            events: self.read_collection(EVENTS),
        }
    }

    /// Rewrite all three collections from `state`.
    pub fn save(&self, state: &AppState) -> Result<()> {
        self.write_collection(GOALS, &state.goals)?;
        self.write_collection(TASKS, &state.tasks)?;
        self.write_collection(EVENTS, &state.events)?;
        info!(
            goals = state.goals.len(),
            tasks = state.tasks.len(),
            events = state.events.len(),
            "store saved"
        );
        Ok(())
    }

    /// Record counts per collection, as found on disk.
    pub fn collection_counts(&self) -> Vec<(&'static str, usize)> {
        let state = self.load();
        vec![
            (GOALS, state.goals.len()),
            (TASKS, state.tasks.len()),
            (EVENTS, state.events.len()),
        ]
    }

    fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        let path = self.config.collection_path(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(collection = name, error = %e, "failed to read collection, using empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(records) => records,
            Err(e) => {
                warn!(collection = name, error = %e, "malformed collection, using empty");
                Vec::new()
            }
        }
    }

    /// Serialize `records` and replace the collection file.
    pub fn write_collection<T: Serialize>(&self, name: &str, records: &[T]) -> Result<()> {
        let path = self.config.collection_path(name);
        let json = serde_json::to_string_pretty(records)
            .with_context(|| format!("failed to serialize collection {name}"))?;
        write_replace(&path, &json)
            .with_context(|| format!("failed to write collection file {}", path.display()))
    }
}

fn write_replace(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let store = Store::open(StoreConfig::new(&dir)).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.load(), AppState::default());
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = Store::open(StoreConfig::new(tmp.path())).unwrap();
        store.save(&AppState::default()).unwrap();
        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
        assert_eq!(names.len(), 3);
    }
}
