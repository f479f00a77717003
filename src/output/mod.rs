mod progress;
mod render;
mod status;
mod styling;
mod tables;

pub use progress::FetchProgress;
pub use render::{render_choices, render_jobs, render_run_details, render_runs};
pub use styling::{bright_yellow, error_line, info_line, success_line};
pub use tables::projects_table;

use styling::{dim, magenta_bold};

/// Prints the banner to stderr.
///
/// Displays the tool name and version at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("⚡ Quick Workflow"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitHub Actions & GitLab CI monitor")
    );
}
