use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::model::{Job, Run};

use super::status::paint_status;
use super::styling::{blue, dim, green_bold};

/// Width of the workflow-name column in run listings.
const WORKFLOW_WIDTH: usize = 20;
const JOB_NAME_WIDTH: usize = 30;

fn format_minute(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn format_second(at: Option<&DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Numbered listing of runs, in the order given.
///
/// The project column is as wide as the longest project name in `runs`.
pub fn render_runs(runs: &[Run]) -> String {
    let project_width = runs
        .iter()
        .map(|run| run.project.chars().count())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for (i, run) in runs.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:>3}. {:<project_width$} {:<WORKFLOW_WIDTH$} {} [{}] {}",
            i + 1,
            run.project,
            run.workflow_name,
            format_minute(&run.created_at),
            paint_status(&run.status, &run.status, &run.conclusion),
            run.branch,
        );
    }
    output
}

/// Header block shown before a run's jobs.
pub fn render_run_details(run: &Run) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "\n{}", blue("Workflow Details:"));
    let _ = writeln!(output, "Project: {}", green_bold(&run.project));
    let _ = writeln!(output, "Workflow: {}", run.workflow_name);
    let _ = writeln!(
        output,
        "Status: {}",
        paint_status(&run.status, &run.status, &run.conclusion)
    );
    if !run.conclusion.is_empty() && run.conclusion != run.status {
        let _ = writeln!(output, "Conclusion: {}", run.conclusion);
    }
    let _ = writeln!(output, "Branch: {}", run.branch);
    let _ = writeln!(output, "Commit: {}", run.commit);
    let _ = writeln!(output, "Triggered by: {}", run.triggered_by);
    let _ = writeln!(output, "Created: {}", format_second(Some(&run.created_at)));
    let _ = writeln!(output, "Updated: {}", format_second(Some(&run.updated_at)));
    let _ = writeln!(output, "URL: {}", run.url);
    output
}

/// Numbered job listing with each job's steps indented beneath it.
pub fn render_jobs(jobs: &[Job]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", blue("Jobs:"));

    for (i, job) in jobs.iter().enumerate() {
        let _ = writeln!(
            output,
            "  {:>3}. {:<JOB_NAME_WIDTH$} [{}] {}",
            i + 1,
            job.name,
            paint_status(&job.status, &job.status, &job.conclusion),
            dim(format_second(job.started_at.as_ref())),
        );

        for step in &job.steps {
            let _ = writeln!(
                output,
                "         - {} [{}]",
                step.name,
                paint_status(&step.status, &step.status, &step.conclusion),
            );
        }
    }
    output
}

/// Numbered list of plain choices (workflows, branches).
pub fn render_choices(items: &[String]) -> String {
    let mut output = String::new();
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(output, "{:>3}. {item}", i + 1);
    }
    output
}
