//! Configuration file management for flowplan.
//!
//! Provides a TOML-based config file at `~/.config/flowplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use flowplan_core::plan::{DEFAULT_MAX_PHRASES, DEFAULT_OVERFLOW_DAYS};
use flowplan_core::remote::DEFAULT_TIMEOUT;
use flowplan_core::{
    GoalService, HttpRemote, Planner, PlannerOptions, RemoteConfig, UuidIds, WorkCalendar,
};
use flowplan_store::{Store, StoreConfig};

pub const REMOTE_URL_ENV: &str = "FLOWPLAN_REMOTE_URL";
pub const OFFLINE_ENV: &str = "FLOWPLAN_OFFLINE";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub store: StoreSection,
    pub remote: RemoteSection,
    pub calendar: WorkCalendar,
    pub planner: PlannerSection,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    /// Base URL of the planning/scheduling service; unset means local only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSection {
    pub max_phrases: usize,
    pub overflow_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub timezone: String,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            max_phrases: DEFAULT_MAX_PHRASES,
            overflow_days: DEFAULT_OVERFLOW_DAYS,
            locale: None,
            timezone: "UTC".to_string(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the flowplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/flowplan` or `~/.config/flowplan`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("flowplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("flowplan")
}

/// Return the path to the flowplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file. A missing file yields the defaults; a file that
/// exists but does not parse is an error.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct FlowplanConfig {
    pub store_config: StoreConfig,
    /// `None` when running offline or when no service URL is configured.
    pub remote: Option<RemoteConfig>,
    pub planner: PlannerOptions,
}

impl FlowplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Data dir: `cli_data_dir` > `FLOWPLAN_DATA_DIR` > `store.data_dir` > XDG data dir
    /// - Remote URL: `FLOWPLAN_REMOTE_URL` > `remote.url` > none
    /// - Offline: `cli_offline` or a truthy `FLOWPLAN_OFFLINE` disables the remote
    pub fn resolve(cli_data_dir: Option<&str>, cli_offline: bool) -> Result<Self> {
        let file = load_config()?;
        Self::from_file(file, cli_data_dir, cli_offline)
    }

    fn from_file(file: ConfigFile, cli_data_dir: Option<&str>, cli_offline: bool) -> Result<Self> {
        file.calendar
            .validate()
            .context("invalid [calendar] section in config file")?;

        let store_config = if let Some(dir) = cli_data_dir {
            StoreConfig::new(dir)
        } else if let Ok(dir) = std::env::var(StoreConfig::ENV_VAR) {
            StoreConfig::new(dir)
        } else if let Some(dir) = file.store.data_dir {
            StoreConfig::new(dir)
        } else {
            StoreConfig::default()
        };

        let offline = cli_offline || env_flag(OFFLINE_ENV);
        let url = std::env::var(REMOTE_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .or(file.remote.url);
        let remote = match url {
            Some(base_url) if !offline => Some(RemoteConfig {
                base_url,
                timeout: Duration::from_secs(file.remote.timeout_secs),
            }),
            _ => None,
        };

        let planner = PlannerOptions {
            calendar: file.calendar,
            max_phrases: file.planner.max_phrases,
            overflow_days: file.planner.overflow_days,
            locale: file.planner.locale,
            timezone: file.planner.timezone,
        };

        Ok(Self {
            store_config,
            remote,
            planner,
        })
    }

    pub fn open_store(&self) -> Result<Store> {
        Store::open(self.store_config.clone())
    }

    /// Planner wired to the remote services when one is configured.
    pub fn planner(&self) -> Result<Planner> {
        let planner = Planner::local(Arc::new(UuidIds), self.planner.clone());
        match &self.remote {
            Some(remote) => {
                let client = Arc::new(
                    HttpRemote::from_config(remote).context("failed to build HTTP client")?,
                );
                Ok(planner
                    .with_planning(client.clone())
                    .with_scheduling(client))
            }
            None => Ok(planner),
        }
    }

    pub fn goal_service(&self) -> Result<GoalService> {
        Ok(GoalService::new(self.open_store()?, self.planner()?))
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
