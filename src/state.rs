use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WorkflowError};
use crate::model::Project;

pub const STATE_VERSION: &str = "1.0";

/// On-disk layout of the state file.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    version: String,
}

/// Reads every project from `path`. A missing file is an empty registry.
pub fn load_all(path: &Path) -> Result<Vec<Project>> {
    if !path.exists() {
        debug!("No state file at {}, starting empty", path.display());
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        WorkflowError::Config(format!("Failed to read state file {}: {e}", path.display()))
    })?;
    let document: StateDocument = serde_json::from_str(&contents).map_err(|e| {
        WorkflowError::Config(format!("Failed to parse state file {}: {e}", path.display()))
    })?;

    Ok(document.projects)
}

/// Rewrites the whole state file with `projects`.
pub fn save_all(path: &Path, projects: &[Project]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let document = StateDocument {
        projects: projects.to_vec(),
        version: STATE_VERSION.to_string(),
    };
    fs::write(path, serde_json::to_string_pretty(&document)?)?;

    debug!("Saved {} projects to {}", projects.len(), path.display());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyTracked,
}

/// Tracked projects for the duration of one invocation.
pub struct Registry {
    path: PathBuf,
    projects: Vec<Project>,
}

impl Registry {
    pub fn load(path: PathBuf) -> Result<Self> {
        let projects = load_all(&path)?;
        Ok(Self { path, projects })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn find(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Appends and persists `project` unless its name is already tracked.
    pub fn add(&mut self, project: Project) -> Result<AddOutcome> {
        if self.find(&project.name).is_some() {
            return Ok(AddOutcome::AlreadyTracked);
        }

        info!("Tracking project {} ({})", project.name, project.platform);
        self.projects.push(project);
        self.save()?;
        Ok(AddOutcome::Added)
    }

    /// Removes and persists. Returns the removed project, if any.
    pub fn remove(&mut self, name: &str) -> Result<Option<Project>> {
        let Some(index) = self.projects.iter().position(|p| p.name == name) else {
            return Ok(None);
        };

        let removed = self.projects.remove(index);
        self.save()?;
        Ok(Some(removed))
    }

    pub fn save(&self) -> Result<()> {
        save_all(&self.path, &self.projects)
    }
}
