use futures::future::join_all;
use log::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::{Result, WorkflowError};
use crate::model::{Job, Project, ProjectIdentity, Run};

/// A project whose runs could not be fetched.
#[derive(Debug)]
pub struct ProjectFailure {
    pub project: String,
    pub error: WorkflowError,
}

/// Merged runs from every project that answered, plus the ones that did not.
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Newest first
    pub runs: Vec<Run>,
    pub failures: Vec<ProjectFailure>,
}

/// Fetches runs from every project concurrently and merges them.
///
/// One failing project never aborts the others; it is reported in
/// `failures` and left out of `runs`. All requests are joined before the
/// merge, so the result does not depend on completion order.
pub async fn collect_runs(dispatcher: &Dispatcher, projects: &[Project], limit: usize) -> Aggregation {
    let results = join_all(
        projects
            .iter()
            .map(|project| dispatcher.list_runs(project, limit)),
    )
    .await;

    let mut batches = Vec::with_capacity(projects.len());
    let mut failures = Vec::new();

    for (project, result) in projects.iter().zip(results) {
        match result {
            Ok(runs) => batches.push(runs),
            Err(error) => {
                if error.is_remote() {
                    warn!("Failed to get workflows for {}: {error}", project.name);
                } else {
                    debug!("Skipping {}: {error}", project.name);
                }
                failures.push(ProjectFailure {
                    project: project.name.clone(),
                    error,
                });
            }
        }
    }

    let runs = merge_runs(batches);
    info!(
        "Collected {} runs from {} projects ({} failed)",
        runs.len(),
        projects.len() - failures.len(),
        failures.len()
    );

    Aggregation { runs, failures }
}

/// Concatenates and sorts newest first. The sort is stable, so runs sharing a
/// timestamp keep their input order.
pub fn merge_runs(batches: impl IntoIterator<Item = Vec<Run>>) -> Vec<Run> {
    let mut runs: Vec<Run> = batches.into_iter().flatten().collect();
    runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    runs
}

/// Rebuilds the project a run came from, for follow-up queries.
pub fn project_for_run(run: &Run) -> Result<Project> {
    let identity = ProjectIdentity::parse(&run.project)?;

    Ok(Project {
        name: identity.name(),
        owner: identity.owner,
        repo: identity.repo,
        platform: run.platform.clone(),
        remote_url: String::new(),
        added_at: chrono::Local::now().fixed_offset(),
        access_token: None,
    })
}

/// Jobs of the selected run. A tracked project's record is preferred so its
/// own token is used; otherwise the identity is recovered from the run.
pub async fn jobs_for_run(
    dispatcher: &Dispatcher,
    tracked: &[Project],
    run: &Run,
) -> Result<Vec<Job>> {
    let rebuilt = project_for_run(run)?;
    let project = tracked
        .iter()
        .find(|p| p.name == rebuilt.name && p.platform == rebuilt.platform)
        .unwrap_or(&rebuilt);

    dispatcher.list_jobs(project, &run.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::config::Endpoints;
    use crate::model::Platform;
    use chrono::{DateTime, TimeZone, Utc};
    use mockito::Matcher;
    use std::sync::Arc;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, hour, 0, 0).unwrap()
    }

    fn run(id: &str, project: &str, created: DateTime<Utc>) -> Run {
        Run {
            id: id.to_string(),
            project: project.to_string(),
            workflow_name: "CI".to_string(),
            status: "completed".to_string(),
            conclusion: "success".to_string(),
            created_at: created,
            updated_at: created,
            url: String::new(),
            platform: Platform::GitHub,
            branch: "main".to_string(),
            commit: String::new(),
            triggered_by: String::new(),
        }
    }

    #[test]
    fn test_merge_sorts_newest_first() {
        let merged = merge_runs(vec![
            vec![run("a1", "a/a", at(1)), run("a3", "a/a", at(3))],
            vec![run("b2", "b/b", at(2)), run("b5", "b/b", at(5))],
            vec![],
        ]);

        let ids: Vec<_> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b5", "a3", "b2", "a1"]);
        assert!(merged
            .windows(2)
            .all(|pair| pair[0].created_at > pair[1].created_at));
    }

    #[test]
    fn test_merge_is_stable_on_ties() {
        let batches = || {
            vec![
                vec![run("x", "a/a", at(4)), run("y", "a/a", at(4))],
                vec![run("z", "b/b", at(4))],
            ]
        };

        let first: Vec<_> = merge_runs(batches()).into_iter().map(|r| r.id).collect();
        let second: Vec<_> = merge_runs(batches()).into_iter().map(|r| r.id).collect();
        assert_eq!(first, ["x", "y", "z"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_project_for_run() {
        let mut gitlab_run = run("77", "group/app", at(1));
        gitlab_run.platform = Platform::GitLab;

        let project = project_for_run(&gitlab_run).unwrap();
        assert_eq!(project.name, "group/app");
        assert_eq!(project.owner, "group");
        assert_eq!(project.repo, "app");
        assert_eq!(project.platform, Platform::GitLab);

        let broken = run("1", "no-separator", at(1));
        assert!(matches!(
            project_for_run(&broken),
            Err(WorkflowError::MalformedProjectIdentity(_))
        ));
    }

    fn github_runs_body(runs: &[(u64, &str)]) -> String {
        let entries: Vec<String> = runs
            .iter()
            .map(|(id, created)| {
                format!(
                    r#"{{"id": {id}, "name": "CI", "head_branch": "main", "head_sha": "s{id}",
                       "status": "completed", "conclusion": "success",
                       "created_at": "{created}", "updated_at": "{created}",
                       "html_url": "https://github.com/acme/api/actions/runs/{id}"}}"#
                )
            })
            .collect();
        format!(r#"{{"workflow_runs": [{}]}}"#, entries.join(","))
    }

    #[tokio::test]
    async fn test_collect_merges_across_platforms() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/api/actions/runs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(github_runs_body(&[
                (3, "2025-01-08T03:00:00Z"),
                (2, "2025-01-08T02:00:00Z"),
                (1, "2025-01-08T01:00:00Z"),
            ]))
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/projects/group%2Fapp/pipelines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[
  {"id": 40, "ref": "main", "sha": "x", "status": "running",
   "created_at": "2025-01-08T04:00:00Z", "updated_at": "2025-01-08T04:00:00Z", "web_url": ""},
  {"id": 10, "ref": "main", "sha": "y", "status": "success",
   "created_at": "2025-01-08T00:00:00Z", "updated_at": "2025-01-08T00:30:00Z", "web_url": ""}
]"#,
            )
            .create_async()
            .await;

        let dispatcher = Dispatcher::new(
            Endpoints {
                github: server.url(),
                gitlab: server.url(),
            },
            Arc::new(Credentials::new(Some("ghp"), Some("glpat"))),
        );
        let projects = vec![
            Project::new("acme", "api", Platform::GitHub, ""),
            Project::new("group", "app", Platform::GitLab, ""),
        ];

        let aggregation = collect_runs(&dispatcher, &projects, 10).await;
        assert!(aggregation.failures.is_empty());

        let order: Vec<_> = aggregation
            .runs
            .iter()
            .map(|r| (r.project.as_str(), r.id.as_str()))
            .collect();
        assert_eq!(
            order,
            [
                ("group/app", "40"),
                ("acme/api", "3"),
                ("acme/api", "2"),
                ("acme/api", "1"),
                ("group/app", "10"),
            ]
        );
    }

    #[tokio::test]
    async fn test_one_failing_project_does_not_abort() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/api/actions/runs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(github_runs_body(&[(7, "2025-01-08T07:00:00Z")]))
            .create_async()
            .await;
        server
            .mock("GET", "/repos/acme/down/actions/runs")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;
        server
            .mock("GET", "/repos/acme/web/actions/runs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(github_runs_body(&[(8, "2025-01-08T08:00:00Z")]))
            .create_async()
            .await;

        let dispatcher = Dispatcher::new(
            Endpoints {
                github: server.url(),
                gitlab: server.url(),
            },
            Arc::new(Credentials::new(Some("ghp"), None)),
        );
        let projects = vec![
            Project::new("acme", "api", Platform::GitHub, ""),
            Project::new("acme", "down", Platform::GitHub, ""),
            Project::new("acme", "web", Platform::GitHub, ""),
            Project::new("acme", "odd", Platform::Unsupported("svn".to_string()), ""),
        ];

        let aggregation = collect_runs(&dispatcher, &projects, 10).await;

        let ids: Vec<_> = aggregation.runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["8", "7"]);

        assert_eq!(aggregation.failures.len(), 2);
        let down = &aggregation.failures[0];
        assert_eq!(down.project, "acme/down");
        assert!(matches!(down.error, WorkflowError::Api { status: 503, .. }));
        let odd = &aggregation.failures[1];
        assert_eq!(odd.project, "acme/odd");
        assert!(matches!(odd.error, WorkflowError::UnsupportedPlatform(_)));
    }
}
