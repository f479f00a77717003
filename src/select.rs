use std::io::{BufRead, Write};

use crate::error::{Result, WorkflowError};
use crate::model::Run;

/// What the user picked from a numbered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Quit,
    /// Zero-based position in the listing
    Index(usize),
}

/// Parses a 1-based choice against a listing of `len` entries.
///
/// `q` and empty input quit. Anything else must be a number in `1..=len`.
pub fn parse_selection(input: &str, len: usize) -> Result<Selection> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("q") {
        return Ok(Selection::Quit);
    }

    match input.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(Selection::Index(n - 1)),
        _ => Err(WorkflowError::InvalidSelection(input.to_string())),
    }
}

/// Writes `prompt` and reads one line. End of input reads as `None`.
pub fn read_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompts until the answer is a valid choice or a quit.
///
/// Invalid answers are reported on `output` and asked again.
pub fn prompt_selection<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    len: usize,
) -> Result<Selection> {
    loop {
        let Some(line) = read_line(input, output, prompt)? else {
            return Ok(Selection::Quit);
        };
        match parse_selection(&line, len) {
            Ok(selection) => return Ok(selection),
            Err(e) => writeln!(output, "{}", crate::output::error_line(e))?,
        }
    }
}

/// Where the watch flow stands. Every invocation starts at `Idle`.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum WatchState {
    #[default]
    Idle,
    Listing,
    Listed(Vec<Run>),
    Detail(Run),
}

/// Drives `Idle -> Listing -> Listed -> Detail | Idle`.
#[derive(Debug, Default)]
pub struct WatchFlow {
    state: WatchState,
}

impl WatchFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn start_listing(&mut self) {
        self.state = WatchState::Listing;
    }

    pub fn finish_listing(&mut self, runs: Vec<Run>) {
        self.state = WatchState::Listed(runs);
    }

    /// Applies one answer while `Listed`.
    ///
    /// A valid index moves to `Detail` and returns the run. A quit returns
    /// to `Idle`. Invalid input is an error and keeps the listing.
    pub fn select(&mut self, input: &str) -> Result<Option<Run>> {
        let WatchState::Listed(runs) = &self.state else {
            return Err(WorkflowError::InvalidSelection(input.trim().to_string()));
        };

        match parse_selection(input, runs.len())? {
            Selection::Quit => {
                self.state = WatchState::Idle;
                Ok(None)
            }
            Selection::Index(i) => {
                let run = runs[i].clone();
                self.state = WatchState::Detail(run.clone());
                Ok(Some(run))
            }
        }
    }

    pub fn quit(&mut self) {
        self.state = WatchState::Idle;
    }
}
