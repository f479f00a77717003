use log::{debug, warn};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{Result, WorkflowError};
use crate::model::Platform;
use crate::output::error_line;

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const GITLAB_TOKEN_VAR: &str = "GITLAB_TOKEN";

/// Only token validation is bounded; data queries run without a timeout.
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Bearer credential for a platform API.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Where platform clients get their bearer token from.
pub trait CredentialSource: Send + Sync {
    fn credential(&self, platform: &Platform) -> Option<Token>;
}

/// Name of the environment variable expected to hold the platform's token.
pub fn credential_hint(platform: &Platform) -> &'static str {
    match platform {
        Platform::GitHub => GITHUB_TOKEN_VAR,
        Platform::GitLab => GITLAB_TOKEN_VAR,
        Platform::Unsupported(_) => "a platform token",
    }
}

/// Looks up the token for `platform`, failing with a configuration error that
/// names the variable to set.
pub fn require_credential(source: &dyn CredentialSource, platform: &Platform) -> Result<Token> {
    source.credential(platform).ok_or_else(|| {
        WorkflowError::Config(format!(
            "{} environment variable not set (or run `quick_workflow auth login {platform}`)",
            credential_hint(platform)
        ))
    })
}

/// Tokens resolved once at start-up: environment first, stored login second.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    github: Option<Token>,
    gitlab: Option<Token>,
}

impl Credentials {
    pub fn new(github: Option<&str>, gitlab: Option<&str>) -> Self {
        Self {
            github: github.map(Token::from),
            gitlab: gitlab.map(Token::from),
        }
    }

    pub fn from_env(stored: &StoredAuth) -> Self {
        let github = resolve_token(GITHUB_TOKEN_VAR, stored.github_token.as_deref());
        let gitlab = resolve_token(GITLAB_TOKEN_VAR, stored.gitlab_token.as_deref());

        Self::new(github.as_deref(), gitlab.as_deref())
    }
}

impl CredentialSource for Credentials {
    fn credential(&self, platform: &Platform) -> Option<Token> {
        match platform {
            Platform::GitHub => self.github.clone(),
            Platform::GitLab => self.gitlab.clone(),
            Platform::Unsupported(_) => None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// A set, non-blank variable wins over the stored token.
fn resolve_token(var: &str, stored: Option<&str>) -> Option<String> {
    non_empty_var(var).or_else(|| stored.map(str::to_string))
}

/// Tokens saved by `auth login`, kept in `auth.json` next to the state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_host: Option<String>,
}

impl StoredAuth {
    /// Missing file yields an empty record.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Like `load`, but an unreadable file is reported on `report` and read
    /// as empty.
    pub fn load_or_report<W: Write>(path: &Path, report: &mut W) -> Self {
        match Self::load(path) {
            Ok(auth) => auth,
            Err(e) => {
                warn!("Ignoring unreadable auth file {}: {e}", path.display());
                let _ = writeln!(
                    report,
                    "{}",
                    error_line(format!(
                        "Ignoring unreadable auth file {}: {e}. Stored tokens are not used.",
                        path.display()
                    ))
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        fs::write(path, serde_json::to_string_pretty(self)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Fields set in `update` replace the stored ones; the rest is kept.
    pub fn merge(&mut self, update: StoredAuth) {
        if update.github_token.is_some() {
            self.github_token = update.github_token;
        }
        if update.gitlab_token.is_some() {
            self.gitlab_token = update.gitlab_token;
        }
        if update.gitlab_host.is_some() {
            self.gitlab_host = update.gitlab_host;
        }
    }

    pub fn clear(&mut self, platform: &Platform) {
        match platform {
            Platform::GitHub => self.github_token = None,
            Platform::GitLab => {
                self.gitlab_token = None;
                self.gitlab_host = None;
            }
            Platform::Unsupported(_) => {}
        }
    }
}

/// Checks a token against the platform's `/user` endpoint.
///
/// `base_url` is the GitHub API root (e.g. `https://api.github.com`) or the
/// GitLab instance root (e.g. `https://gitlab.com`).
pub async fn validate_token(platform: &Platform, base_url: &str, token: &Token) -> Result<()> {
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
        .map_err(|e| WorkflowError::Config(format!("Invalid base URL: {e}")))?;

    let endpoint = match platform {
        Platform::GitHub => "user",
        Platform::GitLab => "api/v4/user",
        Platform::Unsupported(other) => {
            return Err(WorkflowError::UnsupportedPlatform(other.clone()))
        }
    };
    let url = base
        .join(endpoint)
        .map_err(|e| WorkflowError::Config(format!("Invalid validation URL: {e}")))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("quick-workflow/", env!("CARGO_PKG_VERSION")))
        .timeout(VALIDATION_TIMEOUT)
        .build()
        .map_err(|e| WorkflowError::Config(format!("Failed to create HTTP client: {e}")))?;

    debug!("Validating {platform} token against {url}");

    let response = client
        .get(url)
        .bearer_auth(token.as_str())
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(WorkflowError::Api {
            status: status.as_u16(),
            message: format!("{platform} rejected the token"),
        });
    }

    Ok(())
}
