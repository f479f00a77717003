use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file structure for quick_workflow.
///
/// Every field has a default, so an absent or partial file is fine. Files are
/// looked up in the per-user configuration directory unless a path is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub gitlab: GitLabConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub REST API root
    #[serde(default = "default_github_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// GitLab instance root; `api/v4/` is appended by the client
    #[serde(default = "default_gitlab_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultsConfig {
    /// Runs fetched per project by `watch`
    #[serde(default = "default_watch_limit")]
    pub watch_limit: usize,

    /// Runs fetched per project by `list` when no limit is given
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    /// Ref used when triggering GitHub workflows
    #[serde(default = "default_trigger_ref")]
    pub trigger_ref: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: default_github_base_url(),
        }
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: default_gitlab_base_url(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            watch_limit: default_watch_limit(),
            list_limit: default_list_limit(),
            trigger_ref: default_trigger_ref(),
        }
    }
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_gitlab_base_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_watch_limit() -> usize {
    10
}

fn default_list_limit() -> usize {
    20
}

fn default_trigger_ref() -> String {
    "main".to_string()
}

/// Base URLs handed to the platform clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub github: String,
    pub gitlab: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github: default_github_base_url(),
            gitlab: default_gitlab_base_url(),
        }
    }
}

/// Base URL for a GitLab host as stored by `auth login`. Bare host names get
/// an `https://` scheme.
pub fn gitlab_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// `~/.config/quick_workflow`, shared by the settings, state and auth files.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get user home directory")?;
    Ok(home.join(".config").join("quick_workflow"))
}

pub fn default_state_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("state.json"))
}

pub fn default_auth_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("auth.json"))
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. `<config dir>/config.toml`
    /// 3. `<config dir>/config.json`
    /// 4. `<config dir>/config.yaml`
    /// 5. `<config dir>/config.yml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["config.toml", "config.json", "config.yaml", "config.yml"];

        for candidate in &candidates {
            let path = dir.join(candidate);
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            github: self.github.base_url.clone(),
            gitlab: self.gitlab.base_url.clone(),
        }
    }
}
