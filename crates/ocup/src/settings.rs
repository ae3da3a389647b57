use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ocup_core::{DEFAULT_REPO, HttpTimeouts};
use ocup_platform::{AppPaths, AppPathsError};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Paths(#[from] AppPathsError),
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_repo")]
    pub repo: String,

    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,

    #[serde(default = "default_version_timeout")]
    pub version_timeout_secs: u64,

    /// Used when `--path` is not given.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_repo() -> String {
    DEFAULT_REPO.to_string()
}

fn default_binary_name() -> String {
    "opencode".to_string()
}

fn default_http_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_extract_timeout() -> u64 {
    120
}

fn default_version_timeout() -> u64 {
    15
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            binary_name: default_binary_name(),
            http_timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            extract_timeout_secs: default_extract_timeout(),
            version_timeout_secs: default_version_timeout(),
            install_dir: None,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl AppSettings {
    /// Load settings, writing a default file on first run so it can be
    /// edited.
    pub fn load() -> Self {
        let Ok(paths) = AppPaths::new() else {
            return Self::default();
        };
        let settings_path = paths.settings_file();
        if settings_path.exists() {
            return Self::load_from(&settings_path);
        }

        let settings = Self::default();
        if let Err(error) = settings.save() {
            log::debug!("Could not write default settings: {error}");
        }
        settings
    }

    fn load_from(settings_path: &Path) -> Self {
        if !settings_path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(settings_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let paths = AppPaths::new()?;
        paths.ensure_dirs()?;
        self.save_to(&paths.settings_file())
    }

    fn save_to(&self, settings_path: &Path) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(settings_path, content)?;
        Ok(())
    }

    pub fn http_timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            request: Duration::from_secs(self.http_timeout_secs),
            connect: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}
