use domain::InvalidRun;
use http::header::InvalidHeaderValue;
use jsonwebtoken::errors::Error as JwtError;
use octocrab::Error as OctocrabError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Invalid app configuration: {0}")]
    Configuration(String),
    #[error("Authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },
    #[error("GitHub rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error(transparent)]
    InvalidRun(#[from] InvalidRun),
    #[error(transparent)]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error(transparent)]
    Octocrab(#[from] OctocrabError),
    #[error(transparent)]
    JWT(#[from] JwtError),
    #[error("{0}")]
    Generic(String),
}

pub type Result<T> = core::result::Result<T, GitHubError>;
