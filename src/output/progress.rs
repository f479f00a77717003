use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_yellow};

/// Spinner shown on stderr while runs are fetched from every project.
pub struct FetchProgress {
    pb: ProgressBar,
}

impl FetchProgress {
    pub fn start(project_count: usize) -> Self {
        let pb = create_spinner(
            bright_yellow(format!("Fetching runs from {project_count} projects")).to_string(),
        );
        Self { pb }
    }

    pub fn finish(self, run_count: usize, failed: usize) {
        let message = if failed == 0 {
            bright_green(format!("Fetched {run_count} runs ✓")).to_string()
        } else {
            bright_yellow(format!("Fetched {run_count} runs, {failed} projects failed")).to_string()
        };
        self.pb.finish_with_message(message);
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
