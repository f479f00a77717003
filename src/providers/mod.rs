pub mod github;
pub mod gitlab;

pub use github::GitHubClient;
pub use gitlab::GitLabClient;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Result, WorkflowError};

/// Parses `base_url` so that relative joins land beneath it.
pub(crate) fn api_root(base_url: &str, suffix: &str) -> Result<Url> {
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
        .map_err(|e| WorkflowError::Config(format!("Invalid base URL: {e}")))?;

    base.join(suffix)
        .map_err(|e| WorkflowError::Config(format!("Invalid API base URL: {e}")))
}

/// Maps a non-success status to `NotFound` (404) or `Api`.
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(WorkflowError::NotFound(what.to_string()));
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(WorkflowError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let response = check_status(response, what).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

pub(crate) async fn expect_success(response: Response, what: &str) -> Result<()> {
    check_status(response, what).await.map(|_| ())
}
