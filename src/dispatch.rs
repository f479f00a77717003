use indexmap::IndexMap;
use log::{debug, info};
use std::sync::Arc;

use crate::auth::{require_credential, CredentialSource, Token};
use crate::config::Endpoints;
use crate::error::{Result, WorkflowError};
use crate::model::{Job, Platform, Project, Run};
use crate::providers::{GitHubClient, GitLabClient};

/// The closed set of platform backends. New platforms become new variants.
enum PlatformClient {
    GitHub(GitHubClient),
    GitLab(GitLabClient),
}

/// Routes every operation to the client matching a project's platform.
///
/// Clients are built per call from the injected credential source; no
/// results are cached and nothing is retried. Status strings are passed
/// through exactly as the platform reported them.
pub struct Dispatcher {
    endpoints: Endpoints,
    credentials: Arc<dyn CredentialSource>,
}

impl Dispatcher {
    pub fn new(endpoints: Endpoints, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            endpoints,
            credentials,
        }
    }

    /// Local checks only: platform first, then the credential.
    fn client_for(&self, project: &Project) -> Result<PlatformClient> {
        if let Platform::Unsupported(other) = &project.platform {
            return Err(WorkflowError::UnsupportedPlatform(other.clone()));
        }

        let token = match &project.access_token {
            Some(token) => Token::from(token.as_str()),
            None => require_credential(self.credentials.as_ref(), &project.platform)?,
        };

        match &project.platform {
            Platform::GitHub => Ok(PlatformClient::GitHub(GitHubClient::new(
                &self.endpoints.github,
                &token,
            )?)),
            Platform::GitLab => Ok(PlatformClient::GitLab(GitLabClient::new(
                &self.endpoints.gitlab,
                token,
            )?)),
            Platform::Unsupported(other) => Err(WorkflowError::UnsupportedPlatform(other.clone())),
        }
    }

    pub async fn list_runs(&self, project: &Project, limit: usize) -> Result<Vec<Run>> {
        debug!("Listing up to {limit} runs for {}", project.name);

        match self.client_for(project)? {
            PlatformClient::GitHub(client) => {
                client.list_runs(&project.owner, &project.repo, limit).await
            }
            PlatformClient::GitLab(client) => client.list_pipelines(&project.name, limit).await,
        }
    }

    pub async fn list_jobs(&self, project: &Project, run_id: &str) -> Result<Vec<Job>> {
        debug!("Listing jobs of run {run_id} for {}", project.name);

        match self.client_for(project)? {
            PlatformClient::GitHub(client) => {
                client
                    .list_jobs(&project.owner, &project.repo, run_id)
                    .await
            }
            PlatformClient::GitLab(client) => {
                client.list_pipeline_jobs(&project.name, run_id).await
            }
        }
    }

    /// Workflow file names on GitHub, branch names on GitLab.
    pub async fn list_available_workflows(&self, project: &Project) -> Result<Vec<String>> {
        match self.client_for(project)? {
            PlatformClient::GitHub(client) => {
                client.list_workflows(&project.owner, &project.repo).await
            }
            PlatformClient::GitLab(client) => client.list_branches(&project.name).await,
        }
    }

    /// Starts a run. GitLab pipelines are created for `workflow` itself, as
    /// the names offered for GitLab are branches; `ref_` applies to GitHub.
    pub async fn trigger(
        &self,
        project: &Project,
        workflow: &str,
        ref_: &str,
        variables: &IndexMap<String, String>,
    ) -> Result<()> {
        info!("Triggering '{workflow}' for {}", project.name);

        match self.client_for(project)? {
            PlatformClient::GitHub(client) => {
                client
                    .trigger_workflow(&project.owner, &project.repo, workflow, ref_, variables)
                    .await
            }
            PlatformClient::GitLab(client) => {
                client
                    .trigger_pipeline(&project.name, workflow, variables)
                    .await
            }
        }
    }
}
