use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{Job, Platform, Run, Step};

/// Response from GitHub API for workflow runs.
#[derive(Debug, Deserialize)]
pub struct WorkflowRunsResponse {
    pub workflow_runs: Vec<GitHubWorkflowRun>,
}

/// Response from GitHub API for workflow jobs.
#[derive(Debug, Deserialize)]
pub struct WorkflowJobsResponse {
    pub jobs: Vec<GitHubJob>,
}

/// Response from GitHub API for workflow definitions.
#[derive(Debug, Deserialize)]
pub struct WorkflowsResponse {
    pub workflows: Vec<GitHubWorkflow>,
}

#[derive(Debug, Deserialize)]
pub struct GitHubActor {
    pub login: String,
}

/// GitHub Actions workflow run.
#[derive(Debug, Deserialize)]
pub struct GitHubWorkflowRun {
    pub id: u64,
    /// Name of the workflow
    pub name: Option<String>,
    /// Head branch or tag name
    pub head_branch: Option<String>,
    #[serde(default)]
    pub head_sha: String,
    /// `queued`, `in_progress`, `completed`, ...
    pub status: Option<String>,
    /// `success`, `failure`, `cancelled`, ... once completed
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
    pub triggering_actor: Option<GitHubActor>,
    pub actor: Option<GitHubActor>,
}

/// Job within a GitHub Actions workflow run.
#[derive(Debug, Deserialize)]
pub struct GitHubJob {
    pub id: u64,
    pub run_id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub steps: Vec<GitHubStep>,
}

/// Step within a GitHub Actions job.
#[derive(Debug, Deserialize)]
pub struct GitHubStep {
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct GitHubWorkflow {
    pub name: String,
}

impl GitHubWorkflowRun {
    pub fn into_run(self, project: &str) -> Run {
        let triggered_by = self
            .triggering_actor
            .or(self.actor)
            .map(|actor| actor.login)
            .unwrap_or_default();

        Run {
            id: self.id.to_string(),
            project: project.to_string(),
            workflow_name: self.name.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            conclusion: self.conclusion.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            url: self.html_url,
            platform: Platform::GitHub,
            branch: self.head_branch.unwrap_or_default(),
            commit: self.head_sha,
            triggered_by,
        }
    }
}

impl GitHubJob {
    pub fn into_job(self) -> Job {
        Job {
            id: self.id.to_string(),
            run_id: self.run_id.to_string(),
            name: self.name,
            status: self.status,
            conclusion: self.conclusion.unwrap_or_default(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            steps: self.steps.into_iter().map(GitHubStep::into_step).collect(),
            url: self.html_url.unwrap_or_default(),
        }
    }
}

impl GitHubStep {
    fn into_step(self) -> Step {
        Step {
            name: self.name,
            status: self.status,
            conclusion: self.conclusion.unwrap_or_default(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            logs: None,
        }
    }
}
