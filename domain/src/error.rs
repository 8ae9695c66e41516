use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unable to parse repository \"{0}\", expected owner/repo or a git url")]
    RepoName(String),
    #[error("Invalid check run id \"{0}\"")]
    CheckRunId(String),
    #[error("Malformed payload: {0}")]
    Payload(String),
}

pub type Result<T> = core::result::Result<T, ParseError>;
