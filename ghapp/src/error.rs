use domain::{ParseError, buildkite::EnvironmentError};
use source_control::GitHubError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Configuration(String),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, CommandError>;
