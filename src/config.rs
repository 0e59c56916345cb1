use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Represents the complete configuration for releaseflow.
///
/// Contains the git remote setup, the issue-tracker endpoint, and the
/// build-and-commit command.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

fn default_remotes() -> Vec<String> {
    vec!["origin".to_string()]
}

fn default_develop_branch() -> String {
    "develop".to_string()
}

fn default_master_branch() -> String {
    "master".to_string()
}

/// Git-side configuration: remotes and the two long-lived branches.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitConfig {
    #[serde(default = "default_remotes")]
    pub remotes: Vec<String>,

    #[serde(default = "default_develop_branch")]
    pub develop_branch: String,

    #[serde(default = "default_master_branch")]
    pub master_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            remotes: default_remotes(),
            develop_branch: default_develop_branch(),
            master_branch: default_master_branch(),
        }
    }
}

/// Issue-tracker endpoint configuration.
///
/// Credentials are not stored here; they come from the environment
/// variables `RELEASEFLOW_TRACKER_USER` and `RELEASEFLOW_TRACKER_TOKEN`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TrackerConfig {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub project: String,
}

impl TrackerConfig {
    /// True when a tracker endpoint is configured at all
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.project.is_empty()
    }
}

/// Build-and-commit command configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BuildConfig {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            git: GitConfig::default(),
            tracker: TrackerConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `releaseflow.toml` in current directory
/// 3. `~/.config/.releaseflow.toml` in user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./releaseflow.toml").exists() {
        fs::read_to_string("./releaseflow.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".releaseflow.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    toml::from_str(&config_str)
        .map_err(|e| FlowError::config(format!("Cannot parse configuration: {}", e)))
}
