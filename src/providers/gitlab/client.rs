use indexmap::IndexMap;
use log::debug;
use reqwest::Client;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, WorkflowError};
use crate::model::{Job, Run};
use crate::providers::{api_root, expect_success, read_json};

use super::types::{
    CreatePipeline, GitLabBranch, GitLabJob, GitLabPipeline, PipelineVariable,
};

/// GitLab caps `per_page` at 100.
const MAX_PAGE_SIZE: usize = 100;

/// GitLab REST v4 client. Projects are addressed by their `owner/repo` path.
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Token,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("quick-workflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WorkflowError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_root(base_url, "api/v4/")?,
            token,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.as_str())
    }

    /// `projects/<url-encoded id>/<path>`
    fn project_url(&self, project_id: &str, path: &str) -> Result<Url> {
        self.api_url
            .join(&format!(
                "projects/{}/{path}",
                urlencoding::encode(project_id)
            ))
            .map_err(|e| WorkflowError::Config(format!("Invalid project URL: {e}")))
    }

    /// Most recent pipelines of the project; `limit` is the page size.
    pub async fn list_pipelines(&self, project_id: &str, limit: usize) -> Result<Vec<Run>> {
        let mut url = self.project_url(project_id, "pipelines")?;
        url.query_pairs_mut()
            .append_pair("per_page", &limit.clamp(1, MAX_PAGE_SIZE).to_string());

        debug!("GET {url}");
        let response = self.auth_request(self.client.get(url)).send().await?;
        let pipelines: Vec<GitLabPipeline> =
            read_json(response, &format!("project {project_id}")).await?;

        Ok(pipelines
            .into_iter()
            .map(|pipeline| pipeline.into_run(project_id))
            .collect())
    }

    /// Jobs of one pipeline, each carrying a single mirrored step.
    pub async fn list_pipeline_jobs(&self, project_id: &str, pipeline_id: &str) -> Result<Vec<Job>> {
        let what = format!("pipeline {pipeline_id} in {project_id}");
        let numeric_id: u64 = pipeline_id
            .parse()
            .map_err(|_| WorkflowError::NotFound(what.clone()))?;

        let mut url = self.project_url(project_id, &format!("pipelines/{numeric_id}/jobs"))?;
        url.query_pairs_mut()
            .append_pair("per_page", &MAX_PAGE_SIZE.to_string());

        debug!("GET {url}");
        let response = self.auth_request(self.client.get(url)).send().await?;
        let jobs: Vec<GitLabJob> = read_json(response, &what).await?;

        Ok(jobs
            .into_iter()
            .map(|job| job.into_job(pipeline_id))
            .collect())
    }

    /// GitLab has no list of workflow definitions; branch names are offered
    /// instead, since a pipeline is started for a ref.
    pub async fn list_branches(&self, project_id: &str) -> Result<Vec<String>> {
        let mut url = self.project_url(project_id, "repository/branches")?;
        url.query_pairs_mut()
            .append_pair("per_page", &MAX_PAGE_SIZE.to_string());

        debug!("GET {url}");
        let response = self.auth_request(self.client.get(url)).send().await?;
        let branches: Vec<GitLabBranch> =
            read_json(response, &format!("project {project_id}")).await?;

        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    /// Creates a pipeline for `ref_`, passing `variables` in order.
    pub async fn trigger_pipeline(
        &self,
        project_id: &str,
        ref_: &str,
        variables: &IndexMap<String, String>,
    ) -> Result<()> {
        let url = self.project_url(project_id, "pipeline")?;
        let body = CreatePipeline {
            ref_,
            variables: variables
                .iter()
                .map(|(key, value)| PipelineVariable { key, value })
                .collect(),
        };

        debug!("POST {url}");
        let response = self
            .auth_request(self.client.post(url).json(&body))
            .send()
            .await?;

        expect_success(response, &format!("project {project_id}")).await
    }
}
