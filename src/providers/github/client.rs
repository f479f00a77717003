use indexmap::IndexMap;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use url::Url;

use crate::auth::Token;
use crate::error::{Result, WorkflowError};
use crate::model::{Job, Run};
use crate::providers::{api_root, read_json};

use super::types::{WorkflowJobsResponse, WorkflowRunsResponse, WorkflowsResponse};

/// GitHub caps `per_page` at 100.
const MAX_PAGE_SIZE: usize = 100;

/// GitHub Actions REST client.
#[derive(Clone)]
pub struct GitHubClient {
    /// HTTP client carrying the bearer token
    client: reqwest::Client,
    /// API root, e.g. `https://api.github.com/`
    api_url: Url,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., "https://api.github.com")
    /// * `token` - GitHub personal access token
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL or token cannot be used
    /// to build an HTTP client.
    pub fn new(base_url: &str, token: &Token) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("quick-workflow/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|e| WorkflowError::Config(format!("Invalid GitHub token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| WorkflowError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_root(base_url, "")?,
        })
    }

    fn repo_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url> {
        self.api_url
            .join(&format!("repos/{owner}/{repo}/{path}"))
            .map_err(|e| WorkflowError::Config(format!("Invalid repository URL: {e}")))
    }

    /// Most recent workflow runs of `owner/repo`; `limit` is the page size.
    pub async fn list_runs(&self, owner: &str, repo: &str, limit: usize) -> Result<Vec<Run>> {
        let mut url = self.repo_url(owner, repo, "actions/runs")?;
        url.query_pairs_mut()
            .append_pair("per_page", &limit.clamp(1, MAX_PAGE_SIZE).to_string());

        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let body: WorkflowRunsResponse =
            read_json(response, &format!("repository {owner}/{repo}")).await?;

        let project = format!("{owner}/{repo}");
        Ok(body
            .workflow_runs
            .into_iter()
            .map(|run| run.into_run(&project))
            .collect())
    }

    /// Jobs of a single run, steps included.
    pub async fn list_jobs(&self, owner: &str, repo: &str, run_id: &str) -> Result<Vec<Job>> {
        let what = format!("workflow run {run_id} in {owner}/{repo}");
        let run_id: u64 = run_id
            .parse()
            .map_err(|_| WorkflowError::NotFound(what.clone()))?;

        let mut url = self.repo_url(owner, repo, &format!("actions/runs/{run_id}/jobs"))?;
        url.query_pairs_mut()
            .append_pair("per_page", &MAX_PAGE_SIZE.to_string());

        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let body: WorkflowJobsResponse = read_json(response, &what).await?;

        Ok(body.jobs.into_iter().map(|job| job.into_job()).collect())
    }

    /// Names of the workflow definitions in the repository.
    pub async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<String>> {
        let url = self.repo_url(owner, repo, "actions/workflows")?;

        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let body: WorkflowsResponse =
            read_json(response, &format!("repository {owner}/{repo}")).await?;

        Ok(body.workflows.into_iter().map(|w| w.name).collect())
    }

    /// Workflow dispatch needs the workflow file rather than its display name,
    /// which `list_workflows` does not surface, so triggering is reported as
    /// unsupported.
    pub async fn trigger_workflow(
        &self,
        _owner: &str,
        _repo: &str,
        _workflow: &str,
        _ref_: &str,
        _inputs: &IndexMap<String, String>,
    ) -> Result<()> {
        Err(WorkflowError::NotImplemented(
            "workflow triggering is not yet implemented for GitHub".to_string(),
        ))
    }
}
