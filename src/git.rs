use log::debug;
use std::path::Path;
use std::process::Command;
use url::Url;

use crate::error::{Result, WorkflowError};
use crate::model::Platform;

/// Platform and `owner/repo` derived from a git remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    pub platform: Platform,
    pub owner: String,
    pub repo: String,
}

pub fn is_git_repository(path: &Path) -> bool {
    path.join(".git").is_dir()
}

/// URL of the `origin` remote of the repository at `path`.
pub fn remote_url(path: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["remote", "get-url", "origin"])
        .current_dir(path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WorkflowError::Config(format!(
            "git remote get-url origin failed in {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!("origin of {} is {url}", path.display());
    Ok(url)
}

/// Accepts `https://host/owner/repo(.git)`, `ssh://git@host/owner/repo` and
/// scp-like `git@host:owner/repo(.git)` remotes.
pub fn parse_remote_url(remote: &str) -> Result<RemoteInfo> {
    let unsupported = || WorkflowError::RemoteUrl(remote.to_string());

    let (host, path) = split_host_and_path(remote).ok_or_else(unsupported)?;

    let platform = if host.eq_ignore_ascii_case("github.com") {
        Platform::GitHub
    } else if host.to_ascii_lowercase().contains("gitlab") {
        Platform::GitLab
    } else {
        return Err(unsupported());
    };

    let mut segments = path.trim_matches('/').split('/').filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(unsupported)?;
    let repo = segments
        .next()
        .map(|r| r.trim_end_matches(".git"))
        .filter(|r| !r.is_empty())
        .ok_or_else(unsupported)?;
    // Only owner/repo; nested group paths are rejected
    if segments.next().is_some() {
        return Err(unsupported());
    }

    Ok(RemoteInfo {
        platform,
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

fn split_host_and_path(remote: &str) -> Option<(String, String)> {
    if remote.contains("://") {
        let url = Url::parse(remote).ok()?;
        let host = url.host_str()?.to_string();
        return Some((host, url.path().to_string()));
    }

    // scp-like syntax: [user@]host:path
    let (authority, path) = remote.split_once(':')?;
    let host = authority.rsplit('@').next()?;
    if host.is_empty() {
        return None;
    }
    Some((host.to_string(), path.to_string()))
}
