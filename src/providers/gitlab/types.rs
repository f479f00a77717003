use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Job, Platform, Run, Step};

/// Pipelines without a user are reported as started by the system.
const SYSTEM_USER: &str = "system";

#[derive(Debug, Deserialize)]
pub struct GitLabUser {
    pub username: String,
}

/// Entry of `GET /projects/:id/pipelines`.
#[derive(Debug, Deserialize)]
pub struct GitLabPipeline {
    pub id: u64,
    /// Git reference that triggered the pipeline (e.g., "main", "develop")
    #[serde(rename = "ref", default)]
    pub ref_: String,
    #[serde(default)]
    pub sha: String,
    /// `created`, `pending`, `running`, `success`, `failed`, `canceled`, ...
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub web_url: String,
    pub user: Option<GitLabUser>,
}

/// Entry of `GET /projects/:id/pipelines/:pipeline_id/jobs`.
#[derive(Debug, Deserialize)]
pub struct GitLabJob {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub web_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GitLabBranch {
    pub name: String,
}

/// Body of `POST /projects/:id/pipeline`.
#[derive(Debug, Serialize)]
pub struct CreatePipeline<'a> {
    #[serde(rename = "ref")]
    pub ref_: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<PipelineVariable<'a>>,
}

#[derive(Debug, Serialize)]
pub struct PipelineVariable<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl GitLabPipeline {
    /// GitLab has no separate conclusion, so status doubles as one. The
    /// pipeline's ref stands in for the workflow name.
    pub fn into_run(self, project: &str) -> Run {
        Run {
            id: self.id.to_string(),
            project: project.to_string(),
            workflow_name: self.ref_.clone(),
            conclusion: self.status.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            url: self.web_url,
            platform: Platform::GitLab,
            branch: self.ref_,
            commit: self.sha,
            triggered_by: self
                .user
                .map(|u| u.username)
                .unwrap_or_else(|| SYSTEM_USER.to_string()),
        }
    }
}

impl GitLabJob {
    /// Jobs get exactly one step mirroring the job itself.
    pub fn into_job(self, pipeline_id: &str) -> Job {
        let mut job = Job {
            id: self.id.to_string(),
            run_id: pipeline_id.to_string(),
            name: self.name,
            conclusion: self.status.clone(),
            status: self.status,
            started_at: self.started_at,
            completed_at: self.finished_at,
            steps: Vec::with_capacity(1),
            url: self.web_url,
        };
        job.steps.push(Step::mirroring(&job));
        job
    }
}
