use indexmap::IndexMap;
use log::info;
use std::io::{BufRead, Write};

use crate::aggregate::{collect_runs, jobs_for_run, Aggregation};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::model::Project;
use crate::output::{
    bright_yellow, error_line, info_line, render_choices, render_jobs, render_run_details,
    render_runs, success_line, FetchProgress,
};
use crate::select::{prompt_selection, read_line, Selection, WatchFlow, WatchState};

const EMPTY_REGISTRY_HINT: &str =
    "No projects found. Use 'quick_workflow add' to add a project first.";

/// Ref and variables for `start`.
#[derive(Debug, Clone, Default)]
pub struct TriggerRequest {
    pub ref_: String,
    pub variables: IndexMap<String, String>,
}

async fn fetch<W: Write>(
    dispatcher: &Dispatcher,
    projects: &[Project],
    limit: usize,
    output: &mut W,
) -> Result<Aggregation> {
    let progress = FetchProgress::start(projects.len());
    let aggregation = collect_runs(dispatcher, projects, limit).await;
    progress.finish(aggregation.runs.len(), aggregation.failures.len());

    for failure in &aggregation.failures {
        writeln!(
            output,
            "{}",
            error_line(format!(
                "Failed to get workflows for {}: {}",
                failure.project, failure.error
            ))
        )?;
    }
    Ok(aggregation)
}

/// Aggregated listing without interaction.
pub async fn list<W: Write>(
    dispatcher: &Dispatcher,
    projects: &[Project],
    limit: usize,
    output: &mut W,
) -> Result<()> {
    if projects.is_empty() {
        writeln!(output, "{}", info_line(EMPTY_REGISTRY_HINT))?;
        return Ok(());
    }

    let aggregation = fetch(dispatcher, projects, limit, output).await?;
    if aggregation.runs.is_empty() {
        writeln!(output, "{}", info_line("No workflow runs found."))?;
        return Ok(());
    }

    writeln!(output, "\n{}", bright_yellow("Recent Workflows:"))?;
    write!(output, "{}", render_runs(&aggregation.runs))?;
    Ok(())
}

/// Aggregated listing followed by drill-down into one run's jobs.
pub async fn watch<R: BufRead, W: Write>(
    dispatcher: &Dispatcher,
    projects: &[Project],
    limit: usize,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    if projects.is_empty() {
        writeln!(output, "{}", info_line(EMPTY_REGISTRY_HINT))?;
        return Ok(());
    }

    let mut flow = WatchFlow::new();
    flow.start_listing();
    let aggregation = fetch(dispatcher, projects, limit, output).await?;
    if aggregation.runs.is_empty() {
        writeln!(output, "{}", info_line("No workflow runs found."))?;
        flow.quit();
        return Ok(());
    }

    writeln!(output, "\n{}", bright_yellow("Recent Workflows:"))?;
    write!(output, "{}", render_runs(&aggregation.runs))?;
    flow.finish_listing(aggregation.runs);

    loop {
        let Some(line) = read_line(
            input,
            output,
            "\nSelect a workflow to view details (number, q to quit): ",
        )?
        else {
            flow.quit();
            return Ok(());
        };

        match flow.select(&line) {
            Ok(Some(_)) => break,
            Ok(None) => return Ok(()),
            Err(e) => writeln!(output, "{}", error_line(e))?,
        }
    }

    let WatchState::Detail(run) = flow.state() else {
        return Ok(());
    };
    write!(output, "{}", render_run_details(run))?;
    match jobs_for_run(dispatcher, projects, run).await {
        Ok(jobs) if jobs.is_empty() => {
            writeln!(output, "{}", info_line("No jobs found for this run."))?
        }
        Ok(jobs) => write!(output, "\n{}", render_jobs(&jobs))?,
        Err(e) => writeln!(
            output,
            "{}",
            error_line(format!("Failed to get jobs: {e}"))
        )?,
    }
    Ok(())
}

/// Picks one of `choices`, skipping the prompt when there is only one.
fn choose<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    heading: &str,
    prompt: &str,
    choices: &[String],
) -> Result<Option<usize>> {
    if choices.len() == 1 {
        return Ok(Some(0));
    }

    writeln!(output, "\n{}", bright_yellow(heading))?;
    write!(output, "{}", render_choices(choices))?;
    match prompt_selection(input, output, prompt, choices.len())? {
        Selection::Index(i) => Ok(Some(i)),
        Selection::Quit => Ok(None),
    }
}

/// Project selection, workflow selection, then trigger.
///
/// Remote failures and unimplemented triggers are reported on `output`; the
/// returned error is reserved for terminal I/O.
pub async fn start<R: BufRead, W: Write>(
    dispatcher: &Dispatcher,
    projects: &[Project],
    request: &TriggerRequest,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    if projects.is_empty() {
        writeln!(output, "{}", info_line(EMPTY_REGISTRY_HINT))?;
        return Ok(());
    }

    let names: Vec<String> = projects.iter().map(|p| p.name.clone()).collect();
    let Some(index) = choose(
        input,
        output,
        "Available Projects:",
        "\nSelect a project (number, q to quit): ",
        &names,
    )?
    else {
        return Ok(());
    };
    let project = &projects[index];

    let workflows = match dispatcher.list_available_workflows(project).await {
        Ok(workflows) => workflows,
        Err(e) => {
            writeln!(
                output,
                "{}",
                error_line(format!("Failed to get workflows for {}: {e}", project.name))
            )?;
            return Ok(());
        }
    };
    if workflows.is_empty() {
        writeln!(
            output,
            "{}",
            info_line(format!("No workflows found for {}.", project.name))
        )?;
        return Ok(());
    }

    let Some(index) = choose(
        input,
        output,
        "Available Workflows:",
        "\nSelect a workflow (number, q to quit): ",
        &workflows,
    )?
    else {
        return Ok(());
    };
    let workflow = &workflows[index];

    info!("Starting {workflow} on {} at {}", project.name, request.ref_);
    match dispatcher
        .trigger(project, workflow, &request.ref_, &request.variables)
        .await
    {
        Ok(()) => writeln!(
            output,
            "{}",
            success_line(format!("Triggered {workflow} for {}", project.name))
        )?,
        Err(e) => writeln!(
            output,
            "{}",
            error_line(format!("Failed to trigger workflow: {e}"))
        )?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::config::Endpoints;
    use crate::model::Platform;
    use mockito::Matcher;
    use std::io::Cursor;
    use std::sync::Arc;

    const GITHUB_RUNS: &str = r#"{"workflow_runs": [
  {"id": 501, "name": "CI", "head_branch": "main", "head_sha": "abc",
   "status": "completed", "conclusion": "failure",
   "created_at": "2025-01-08T10:00:00Z", "updated_at": "2025-01-08T10:05:00Z",
   "html_url": "https://github.com/acme/api/actions/runs/501"}
]}"#;

    fn dispatcher_for(server: &mockito::Server) -> Dispatcher {
        Dispatcher::new(
            Endpoints {
                github: server.url(),
                gitlab: server.url(),
            },
            Arc::new(Credentials::new(Some("ghp"), Some("glpat"))),
        )
    }

    fn plain(output: Vec<u8>) -> String {
        console::strip_ansi_codes(&String::from_utf8(output).unwrap()).to_string()
    }

    #[tokio::test]
    async fn test_empty_registry_prints_hint() {
        let server = mockito::Server::new_async().await;
        let dispatcher = dispatcher_for(&server);
        let mut output = Vec::new();

        list(&dispatcher, &[], 20, &mut output).await.unwrap();
        watch(&dispatcher, &[], 10, &mut Cursor::new(""), &mut output)
            .await
            .unwrap();

        let text = plain(output);
        assert_eq!(text.matches("quick_workflow add").count(), 2);
    }

    #[tokio::test]
    async fn test_list_reports_failures_and_renders_rest() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/api/actions/runs")
            .match_query(Matcher::UrlEncoded("per_page".into(), "20".into()))
            .with_status(200)
            .with_body(GITHUB_RUNS)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/projects/group%2Fapp/pipelines")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message": "401 Unauthorized"}"#)
            .create_async()
            .await;

        let projects = vec![
            Project::new("acme", "api", Platform::GitHub, ""),
            Project::new("group", "app", Platform::GitLab, ""),
        ];
        let mut output = Vec::new();
        list(&dispatcher_for(&server), &projects, 20, &mut output)
            .await
            .unwrap();

        let text = plain(output);
        assert!(text.contains("Error: Failed to get workflows for group/app"));
        assert!(text.contains("  1. acme/api CI"));
        assert!(text.contains("[completed] main"));
    }

    #[tokio::test]
    async fn test_watch_reprompts_then_shows_jobs() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/api/actions/runs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(GITHUB_RUNS)
            .create_async()
            .await;
        let jobs = server
            .mock("GET", "/repos/acme/api/actions/runs/501/jobs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"jobs": [
  {"id": 9, "run_id": 501, "name": "test", "status": "completed", "conclusion": "failure",
   "started_at": "2025-01-08T10:01:00Z", "completed_at": "2025-01-08T10:04:00Z",
   "steps": [
     {"name": "Checkout", "status": "completed", "conclusion": "success"},
     {"name": "Run tests", "status": "completed", "conclusion": "failure"}
   ]}
]}"#,
            )
            .create_async()
            .await;

        let projects = vec![Project::new("acme", "api", Platform::GitHub, "")];
        let mut input = Cursor::new("0\nabc\n1\n");
        let mut output = Vec::new();
        watch(&dispatcher_for(&server), &projects, 10, &mut input, &mut output)
            .await
            .unwrap();
        jobs.assert_async().await;

        let text = plain(output);
        assert_eq!(text.matches("Error: Invalid selection").count(), 2);
        assert!(text.contains("Workflow Details:"));
        assert!(text.contains("Project: acme/api"));
        assert!(text.contains("1. test"));
        assert!(text.contains("- Checkout [completed]"));
        assert!(text.contains("- Run tests [completed]"));
    }

    #[tokio::test]
    async fn test_watch_quit_skips_drill_down() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/api/actions/runs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(GITHUB_RUNS)
            .create_async()
            .await;
        let jobs = server
            .mock("GET", Matcher::Regex("/jobs".to_string()))
            .expect(0)
            .create_async()
            .await;

        let projects = vec![Project::new("acme", "api", Platform::GitHub, "")];
        let mut output = Vec::new();
        watch(
            &dispatcher_for(&server),
            &projects,
            10,
            &mut Cursor::new("q\n"),
            &mut output,
        )
        .await
        .unwrap();
        jobs.assert_async().await;

        assert!(!plain(output).contains("Workflow Details:"));
    }

    #[tokio::test]
    async fn test_start_reports_unimplemented_trigger() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/api/actions/workflows")
            .with_status(200)
            .with_body(r#"{"workflows": [{"name": "CI"}, {"name": "Deploy"}]}"#)
            .create_async()
            .await;
        let posts = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let projects = vec![Project::new("acme", "api", Platform::GitHub, "")];
        let request = TriggerRequest {
            ref_: "main".to_string(),
            ..Default::default()
        };
        let dispatcher = dispatcher_for(&server);

        // Repeated attempts keep working
        for _ in 0..2 {
            let mut output = Vec::new();
            start(
                &dispatcher,
                &projects,
                &request,
                &mut Cursor::new("2\n"),
                &mut output,
            )
            .await
            .unwrap();

            let text = plain(output);
            assert!(text.contains("  2. Deploy"));
            assert!(text.contains("Error: Failed to trigger workflow"));
            assert!(text.contains("not yet implemented"));
        }
        posts.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_triggers_selected_gitlab_branch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/group%2Fapp/repository/branches")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"name": "main"}, {"name": "release"}]"#)
            .create_async()
            .await;
        let trigger = server
            .mock("POST", "/api/v4/projects/group%2Fapp/pipeline")
            .match_body(Matcher::Json(serde_json::json!({
                "ref": "release",
                "variables": [{"key": "DEPLOY_ENV", "value": "staging"}]
            })))
            .with_status(201)
            .with_body(r#"{"id": 77}"#)
            .create_async()
            .await;

        let projects = vec![
            Project::new("acme", "api", Platform::GitHub, ""),
            Project::new("group", "app", Platform::GitLab, ""),
        ];
        let mut variables = IndexMap::new();
        variables.insert("DEPLOY_ENV".to_string(), "staging".to_string());
        let request = TriggerRequest {
            ref_: "main".to_string(),
            variables,
        };

        let mut output = Vec::new();
        start(
            &dispatcher_for(&server),
            &projects,
            &request,
            &mut Cursor::new("2\n2\n"),
            &mut output,
        )
        .await
        .unwrap();
        trigger.assert_async().await;

        let text = plain(output);
        assert!(text.contains("  1. acme/api"));
        assert!(text.contains("Success: Triggered release for group/app"));
    }

    #[tokio::test]
    async fn test_start_quit_at_project_prompt() {
        let server = mockito::Server::new_async().await;
        let projects = vec![
            Project::new("acme", "api", Platform::GitHub, ""),
            Project::new("acme", "web", Platform::GitHub, ""),
        ];

        let mut output = Vec::new();
        start(
            &dispatcher_for(&server),
            &projects,
            &TriggerRequest::default(),
            &mut Cursor::new("q\n"),
            &mut output,
        )
        .await
        .unwrap();

        let text = plain(output);
        assert!(text.contains("Available Projects:"));
        assert!(!text.contains("Available Workflows:"));
    }
}
