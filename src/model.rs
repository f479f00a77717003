use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, WorkflowError};

/// Remote CI platform a project is hosted on.
///
/// Persisted as a plain lowercase string. Values other than `github` and
/// `gitlab` are kept verbatim in `Unsupported` so that the registry survives a
/// load/save cycle without losing them; every dispatch on such a project fails
/// locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    GitHub,
    GitLab,
    Unsupported(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Unsupported(other) => other,
        }
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        match value.as_str() {
            "github" => Self::GitHub,
            "gitlab" => Self::GitLab,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Registry key, always `owner/repo`
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub platform: Platform,
    pub remote_url: String,
    pub added_at: DateTime<FixedOffset>,
    /// Per-project token overriding the process-wide credential source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Project {
    pub fn new(owner: &str, repo: &str, platform: Platform, remote_url: &str) -> Self {
        Self {
            name: format!("{owner}/{repo}"),
            owner: owner.to_string(),
            repo: repo.to_string(),
            platform,
            remote_url: remote_url.to_string(),
            added_at: Local::now().fixed_offset(),
            access_token: None,
        }
    }
}

/// Owner and repository recovered from a run's `project` back-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    pub owner: String,
    pub repo: String,
}

impl ProjectIdentity {
    /// Splits `owner/repo`. Anything other than exactly two non-empty parts is rejected.
    pub fn parse(project: &str) -> Result<Self> {
        let mut parts = project.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(WorkflowError::MalformedProjectIdentity(project.to_string())),
        }
    }

    pub fn name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// One execution of a workflow or pipeline.
///
/// `status` and `conclusion` are the platform's own vocabulary and are never
/// normalised; see `output::status` for how they are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub id: String,
    /// `owner/repo` of the project the run was fetched for
    pub project: String,
    pub workflow_name: String,
    pub status: String,
    pub conclusion: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
    pub platform: Platform,
    pub branch: String,
    pub commit: String,
    pub triggered_by: String,
}

/// Unit of work within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: String,
    pub run_id: String,
    pub name: String,
    pub status: String,
    pub conclusion: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// In execution order
    pub steps: Vec<Step>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub name: String,
    pub status: String,
    pub conclusion: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
}

impl Step {
    /// Stand-in step for platforms without a native step concept.
    pub fn mirroring(job: &Job) -> Self {
        Self {
            name: job.name.clone(),
            status: job.status.clone(),
            conclusion: job.conclusion.clone(),
            started_at: job.started_at,
            completed_at: job.completed_at,
            logs: None,
        }
    }
}
