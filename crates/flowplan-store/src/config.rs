use std::env;
use std::path::PathBuf;

/// Store configuration.
///
/// Reads from the `FLOWPLAN_DATA_DIR` environment variable, falling back to
/// `$XDG_DATA_HOME/flowplan` or `~/.local/share/flowplan` when unset.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the JSON collection files.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Environment variable overriding the data directory.
    pub const ENV_VAR: &str = "FLOWPLAN_DATA_DIR";

    /// Build a config from the environment.
    ///
    /// Priority: `FLOWPLAN_DATA_DIR` env var, then [`StoreConfig::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var(Self::ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_data_dir());
        Self { data_dir }
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// XDG-style data directory, independent of the platform conventions
    /// `dirs::data_dir()` would apply.
    pub fn default_data_dir() -> PathBuf {
        if let Ok(xdg) = env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("flowplan");
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("share")
            .join("flowplan")
    }

    /// Path of the file backing `collection`.
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_new() {
        let cfg = StoreConfig::new("/tmp/flowplan-data");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/flowplan-data"));
    }

    #[test]
    fn collection_path_appends_json_extension() {
        let cfg = StoreConfig::new("/data");
        assert_eq!(cfg.collection_path("goals"), PathBuf::from("/data/goals.json"));
    }

    #[test]
    fn default_data_dir_ends_with_flowplan() {
        assert!(StoreConfig::default_data_dir().ends_with("flowplan"));
    }
}
