//! Application configuration and persistence utilities.
//!
//! The configuration lists the chain deployments ("projects") the UI can
//! manage, each with its RPC, indexer API and explorer endpoints and the
//! validators to show. It also remembers the last selection between runs.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{NATIVE_DECIMALS, Project, Validator};

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Other configuration error.
    #[error("{0}")]
    Other(String),
}

/// Theme configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeConfig {
    /// Follow the terminal background.
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeConfig {
    pub fn label(&self) -> &'static str {
        match self {
            ThemeConfig::System => "System",
            ThemeConfig::Light => "Light",
            ThemeConfig::Dark => "Dark",
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the project selected on the last run.
    #[serde(default)]
    pub last_project: Option<String>,
    /// Validator contract opened on the last run.
    #[serde(default)]
    pub last_validator: Option<String>,
    /// Address watched in read-only mode.
    #[serde(default)]
    pub watch_address: Option<String>,
    #[serde(default)]
    pub theme: ThemeConfig,
    /// UI refresh interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_projects")]
    pub projects: Vec<Project>,
}

/// RPC endpoint of the built-in `local` project.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

fn default_tick_ms() -> u64 {
    250
}

fn default_projects() -> Vec<Project> {
    vec![Project {
        name: "local".to_string(),
        chain_id: Some(31337),
        rpc_url: DEFAULT_RPC_URL.to_string(),
        api_url: None,
        explorer_url: None,
        native_symbol: "ETH".to_string(),
        decimals: NATIVE_DECIMALS,
        validators: Vec::new(),
    }]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_project: None,
            last_validator: None,
            watch_address: None,
            theme: ThemeConfig::System,
            tick_ms: default_tick_ms(),
            projects: default_projects(),
        }
    }
}

impl AppConfig {
    /// Find a project by name (case-insensitive).
    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Project to open: the named one, else the last used, else the first.
    pub fn select_project(&self, name: Option<&str>) -> Option<&Project> {
        name.or(self.last_project.as_deref())
            .and_then(|n| self.project(n))
            .or_else(|| self.projects.first())
    }

    /// Add a validator to a project. Does not add duplicates.
    pub fn add_validator(&mut self, project: &str, validator: Validator) -> Result<(), ConfigError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(project))
            .ok_or_else(|| ConfigError::Other(format!("Unknown project: {}", project)))?;
        if project
            .validators
            .iter()
            .any(|v| v.address.eq_ignore_ascii_case(&validator.address))
        {
            return Ok(());
        }
        project.validators.push(validator);
        Ok(())
    }

    /// Remember the current selection for the next run.
    pub fn remember(&mut self, project: &str, validator: Option<&str>) {
        self.last_project = Some(project.to_string());
        if let Some(v) = validator {
            self.last_validator = Some(v.to_string());
        }
    }
}

// ==================== Path Utilities ====================

/// Get the config directory.
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("org", "evmstake", "evmstake")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| ConfigError::Other("Could not determine config directory".to_string()))
}

/// Get the config file path.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    get_config_dir().map(|dir| dir.join("config.json"))
}

// ==================== Config I/O ====================

/// Load configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from `path`, defaulting when the file does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path()?)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Backup a corrupted config file for debugging.
pub fn backup_corrupted_config(path: &Path) -> Result<PathBuf, ConfigError> {
    let parent = path
        .parent()
        .ok_or_else(|| ConfigError::Other("Config path has no parent".to_string()))?;
    let backup_path = parent.join(format!(
        "config.backup.{}",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ));
    fs::copy(path, &backup_path)?;
    Ok(backup_path)
}
