use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid project format: {0} (expected owner/repo)")]
    MalformedProjectIdentity(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Unsupported remote URL format: {0}")]
    RemoteUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkflowError {
    /// True for failures reported by a remote platform (HTTP, transport or payload).
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Network(_) | Self::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
