use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ParseError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CheckRunId(pub u64);

impl Display for CheckRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CheckRunId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(CheckRunId)
            .map_err(|_| ParseError::CheckRunId(s.to_owned()))
    }
}

/// Lifecycle of a check run.
///
/// Only `Queued`, `InProgress` and `Completed` are ever produced here. The
/// remaining variants are reported by the platform for runs owned by other
/// apps and are accepted so that listing a commit never fails on them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
}

impl Status {
    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    TimedOut,
    ActionRequired,
    Skipped,
    Stale,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Output {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Output {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, text: Option<String>) -> Self {
        Self {
            title: Some(title.into()),
            summary: Some(summary.into()),
            text,
        }
    }
}

/// A check run as sent to and received from the platform.
///
/// Absent fields are left out of request bodies, so the same type serves as
/// the create payload, the update payload and the listed record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RunDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CheckRunId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<Conclusion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRun {
    #[error("check run \"{0}\" is completed but has no conclusion")]
    MissingConclusion(String),
    #[error("check run \"{0}\" has a conclusion but is not completed")]
    UnexpectedConclusion(String),
    #[error("check run \"{0}\" is completed but has no completion time")]
    MissingCompletedAt(String),
    #[error("check run \"{0}\" has a completion time but is not completed")]
    UnexpectedCompletedAt(String),
}

impl RunDetails {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            id: None,
            name: name.into(),
            head_sha: None,
            head_branch: None,
            details_url: None,
            external_id: None,
            status,
            conclusion: None,
            started_at: None,
            completed_at: None,
            output: None,
        }
    }

    pub fn is_owned_by(&self, external_id: &str) -> bool {
        self.external_id.as_deref() == Some(external_id)
    }

    /// Checks that conclusion and completion time are present exactly when
    /// the run is completed.
    pub fn validate(&self) -> Result<(), InvalidRun> {
        let name = || self.name.clone();

        match (self.status.is_completed(), self.conclusion, self.completed_at) {
            (true, None, _) => Err(InvalidRun::MissingConclusion(name())),
            (true, Some(_), None) => Err(InvalidRun::MissingCompletedAt(name())),
            (false, Some(_), _) => Err(InvalidRun::UnexpectedConclusion(name())),
            (false, None, Some(_)) => Err(InvalidRun::UnexpectedCompletedAt(name())),
            _ => Ok(()),
        }
    }
}
