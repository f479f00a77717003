use indexmap::IndexMap;
use mockito::Matcher;

use super::GitHubClient;
use crate::auth::Token;
use crate::error::WorkflowError;
use crate::model::Platform;

const RUNS_BODY: &str = r#"{
  "total_count": 2,
  "workflow_runs": [
    {
      "id": 1001,
      "name": "CI",
      "head_branch": "main",
      "head_sha": "abc123",
      "status": "completed",
      "conclusion": "success",
      "created_at": "2025-01-08T10:00:00Z",
      "updated_at": "2025-01-08T10:05:00Z",
      "html_url": "https://github.com/acme/api/actions/runs/1001",
      "triggering_actor": { "login": "octocat" },
      "actor": { "login": "someone-else" }
    },
    {
      "id": 1002,
      "name": "Release",
      "head_branch": null,
      "head_sha": "def456",
      "status": "queued",
      "conclusion": null,
      "created_at": "2025-01-08T11:00:00Z",
      "updated_at": "2025-01-08T11:00:00Z",
      "html_url": "https://github.com/acme/api/actions/runs/1002",
      "actor": { "login": "hubot" }
    }
  ]
}"#;

fn client_for(server: &mockito::Server) -> GitHubClient {
    GitHubClient::new(&server.url(), &Token::from("ghp_test")).unwrap()
}

#[tokio::test]
async fn test_list_runs_maps_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/api/actions/runs")
        .match_query(Matcher::UrlEncoded("per_page".into(), "5".into()))
        .match_header("authorization", "Bearer ghp_test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(RUNS_BODY)
        .create_async()
        .await;

    let runs = client_for(&server).list_runs("acme", "api", 5).await.unwrap();
    mock.assert_async().await;

    assert_eq!(runs.len(), 2);
    let first = &runs[0];
    assert_eq!(first.id, "1001");
    assert_eq!(first.project, "acme/api");
    assert_eq!(first.workflow_name, "CI");
    assert_eq!(first.status, "completed");
    assert_eq!(first.conclusion, "success");
    assert_eq!(first.branch, "main");
    assert_eq!(first.commit, "abc123");
    assert_eq!(first.triggered_by, "octocat");
    assert_eq!(first.platform, Platform::GitHub);
    assert_eq!(first.created_at.to_rfc3339(), "2025-01-08T10:00:00+00:00");

    let second = &runs[1];
    assert_eq!(second.conclusion, "");
    assert_eq!(second.branch, "");
    assert_eq!(second.triggered_by, "hubot");
}

#[tokio::test]
async fn test_list_runs_caps_page_size() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/api/actions/runs")
        .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
        .with_status(200)
        .with_body(r#"{"workflow_runs": []}"#)
        .create_async()
        .await;

    let runs = client_for(&server).list_runs("acme", "api", 500).await.unwrap();
    mock.assert_async().await;
    assert!(runs.is_empty());
}

#[tokio::test]
async fn test_list_runs_surfaces_api_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/api/actions/runs")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message": "Bad credentials"}"#)
        .create_async()
        .await;

    let err = client_for(&server).list_runs("acme", "api", 10).await.unwrap_err();
    match err {
        WorkflowError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("Bad credentials"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_runs_malformed_body_is_remote_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/api/actions/runs")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"workflow_runs": [{"id": "nope"}]}"#)
        .create_async()
        .await;

    let err = client_for(&server).list_runs("acme", "api", 10).await.unwrap_err();
    assert!(err.is_remote());
}

#[tokio::test]
async fn test_list_jobs_keeps_native_steps() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/api/actions/runs/1001/jobs")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{
  "total_count": 1,
  "jobs": [
    {
      "id": 55,
      "run_id": 1001,
      "name": "build",
      "status": "completed",
      "conclusion": "failure",
      "started_at": "2025-01-08T10:00:10Z",
      "completed_at": "2025-01-08T10:03:00Z",
      "html_url": "https://github.com/acme/api/actions/runs/1001/job/55",
      "steps": [
        { "name": "Checkout", "status": "completed", "conclusion": "success", "number": 1,
          "started_at": "2025-01-08T10:00:10Z", "completed_at": "2025-01-08T10:00:12Z" },
        { "name": "Test", "status": "completed", "conclusion": "failure", "number": 2,
          "started_at": "2025-01-08T10:00:12Z", "completed_at": "2025-01-08T10:03:00Z" }
      ]
    }
  ]
}"#,
        )
        .create_async()
        .await;

    let jobs = client_for(&server)
        .list_jobs("acme", "api", "1001")
        .await
        .unwrap();

    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.id, "55");
    assert_eq!(job.run_id, "1001");
    assert_eq!(job.conclusion, "failure");
    assert!(job.started_at.is_some());
    let names: Vec<_> = job.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Checkout", "Test"]);
    assert_eq!(job.steps[1].conclusion, "failure");
}

#[tokio::test]
async fn test_list_jobs_unknown_run_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/api/actions/runs/999/jobs")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let err = client_for(&server)
        .list_jobs("acme", "api", "999")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound(_)));
}

#[tokio::test]
async fn test_list_jobs_non_numeric_id_never_hits_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = client_for(&server)
        .list_jobs("acme", "api", "gid://gitlab/Ci::Pipeline/1")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_workflows_returns_names() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/api/actions/workflows")
        .with_status(200)
        .with_body(
            r#"{"total_count": 2, "workflows": [
                {"id": 1, "name": "CI", "path": ".github/workflows/ci.yml", "state": "active"},
                {"id": 2, "name": "Deploy", "path": ".github/workflows/deploy.yml", "state": "active"}
            ]}"#,
        )
        .create_async()
        .await;

    let workflows = client_for(&server).list_workflows("acme", "api").await.unwrap();
    assert_eq!(workflows, ["CI", "Deploy"]);
}

#[tokio::test]
async fn test_trigger_reports_not_implemented() {
    let server = mockito::Server::new_async().await;
    let err = client_for(&server)
        .trigger_workflow("acme", "api", "CI", "main", &IndexMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotImplemented(_)));
}
