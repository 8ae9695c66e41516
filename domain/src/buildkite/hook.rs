use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::{
    error::ParseError,
    models::{Conclusion, Status},
};

/// A `job.*` webhook delivery.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JobHook {
    pub event: String,
    pub job: Job,
    pub build: Build,
    pub pipeline: Pipeline,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub state: JobState,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Build {
    pub commit: String,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    pub repository: String,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Waiting,
    WaitingFailed,
    Blocked,
    BlockedFailed,
    Unblocked,
    UnblockedFailed,
    Limiting,
    Limited,
    Scheduled,
    Assigned,
    Accepted,
    Running,
    Finished,
    Passed,
    Failed,
    Canceling,
    Canceled,
    TimingOut,
    TimedOut,
    Skipped,
    NotRun,
    Expired,
    Broken,
}

impl JobState {
    pub fn status(&self) -> Status {
        match self {
            JobState::Pending
            | JobState::Waiting
            | JobState::Limiting
            | JobState::Limited
            | JobState::Scheduled
            | JobState::Assigned
            | JobState::Accepted
            | JobState::Unblocked => Status::Queued,
            JobState::Running | JobState::Canceling | JobState::TimingOut => Status::InProgress,
            _ => Status::Completed,
        }
    }

    pub fn conclusion(&self) -> Option<Conclusion> {
        match self {
            JobState::Passed => Some(Conclusion::Success),
            JobState::Failed
            | JobState::Broken
            | JobState::Expired
            | JobState::WaitingFailed
            | JobState::BlockedFailed
            | JobState::UnblockedFailed => Some(Conclusion::Failure),
            JobState::Blocked => Some(Conclusion::ActionRequired),
            JobState::Canceled => Some(Conclusion::Cancelled),
            JobState::TimedOut => Some(Conclusion::TimedOut),
            JobState::Skipped | JobState::NotRun | JobState::Finished => Some(Conclusion::Neutral),
            _ => None,
        }
    }
}

impl JobHook {
    pub fn from_json(payload: &str) -> Result<Self, ParseError> {
        serde_json::from_str(payload).map_err(|e| ParseError::Payload(e.to_string()))
    }

    pub fn run_name(&self) -> &str {
        self.job.name.as_deref().unwrap_or(&self.job.id)
    }
}

// Webhook deliveries use "2019-02-18 01:18:28 UTC", the REST api uses RFC 3339.
fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&value) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S UTC")
        .map(|parsed| Some(parsed.and_utc()))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeZone;

    use super::*;

    pub const JOB_FINISHED: &str = r#"
      {
          "event": "job.finished",
          "job": {
              "id": "382571ad-af38-40d1-b418-46af6b438ae1",
              "type": "script",
              "name": "Error",
              "state": "failed",
              "web_url": "https://buildkite.com/uw-ipd/test-checks/builds/15#382571ad-af38-40d1-b418-46af6b438ae1",
              "exit_status": 1,
              "started_at": "2018-06-13 18:23:31 UTC",
              "finished_at": "2018-06-13 18:23:42 UTC"
          },
          "build": {
              "id": "deefbbee-3bca-476f-b411-ae5d5573c11c",
              "commit": "df998e034720a29ecc301e3d1cc80a3dad085492",
              "branch": "master"
          },
          "pipeline": {
              "slug": "test-checks",
              "repository": "git@github.com:asford/test_checks.git"
          },
          "sender": { "name": "Alex Ford" }
      }
    "#;

    pub const JOB_STARTED: &str = r#"
      {
          "event": "job.started",
          "job": {
              "id": "382571ad-af38-40d1-b418-46af6b438ae1",
              "name": "Error",
              "state": "running",
              "web_url": "https://buildkite.com/uw-ipd/test-checks/builds/15#382571ad-af38-40d1-b418-46af6b438ae1",
              "started_at": "2018-06-13T18:23:31.000Z",
              "finished_at": null
          },
          "build": {
              "commit": "df998e034720a29ecc301e3d1cc80a3dad085492",
              "branch": "master"
          },
          "pipeline": {
              "repository": "git@github.com:asford/test_checks.git"
          }
      }
    "#;

    #[test]
    fn from_json_should_parse_webhook_timestamps() {
        let hook = JobHook::from_json(JOB_FINISHED).unwrap();

        assert_eq!(hook.event, "job.finished");
        assert_eq!(hook.job.state, JobState::Failed);
        assert_eq!(hook.run_name(), "Error");
        assert_eq!(
            hook.job.started_at,
            Some(Utc.with_ymd_and_hms(2018, 6, 13, 18, 23, 31).unwrap())
        );
        assert_eq!(
            hook.job.finished_at,
            Some(Utc.with_ymd_and_hms(2018, 6, 13, 18, 23, 42).unwrap())
        );
    }

    #[test]
    fn from_json_should_parse_rfc3339_timestamps() {
        let hook = JobHook::from_json(JOB_STARTED).unwrap();

        assert_eq!(hook.job.state, JobState::Running);
        assert_eq!(
            hook.job.started_at,
            Some(Utc.with_ymd_and_hms(2018, 6, 13, 18, 23, 31).unwrap())
        );
        assert_eq!(hook.job.finished_at, None);
    }

    #[test]
    fn from_json_should_reject_unknown_state() {
        let payload = JOB_STARTED.replace("\"running\"", "\"exploded\"");

        assert!(matches!(
            JobHook::from_json(&payload),
            Err(ParseError::Payload(_))
        ));
    }

    #[test]
    fn job_state_should_map_to_status_and_conclusion() {
        let cases = [
            (JobState::Scheduled, Status::Queued, None),
            (JobState::Running, Status::InProgress, None),
            (JobState::Canceling, Status::InProgress, None),
            (JobState::Passed, Status::Completed, Some(Conclusion::Success)),
            (JobState::Failed, Status::Completed, Some(Conclusion::Failure)),
            (JobState::Blocked, Status::Completed, Some(Conclusion::ActionRequired)),
            (JobState::Canceled, Status::Completed, Some(Conclusion::Cancelled)),
            (JobState::TimedOut, Status::Completed, Some(Conclusion::TimedOut)),
            (JobState::Skipped, Status::Completed, Some(Conclusion::Neutral)),
            (JobState::NotRun, Status::Completed, Some(Conclusion::Neutral)),
        ];

        for (state, status, conclusion) in cases {
            assert_eq!(state.status(), status, "{state:?}");
            assert_eq!(state.conclusion(), conclusion, "{state:?}");
        }
    }

    #[test]
    fn every_completed_state_should_have_a_conclusion() {
        let states = [
            JobState::Pending,
            JobState::Waiting,
            JobState::WaitingFailed,
            JobState::Blocked,
            JobState::BlockedFailed,
            JobState::Unblocked,
            JobState::UnblockedFailed,
            JobState::Limiting,
            JobState::Limited,
            JobState::Scheduled,
            JobState::Assigned,
            JobState::Accepted,
            JobState::Running,
            JobState::Finished,
            JobState::Passed,
            JobState::Failed,
            JobState::Canceling,
            JobState::Canceled,
            JobState::TimingOut,
            JobState::TimedOut,
            JobState::Skipped,
            JobState::NotRun,
            JobState::Expired,
            JobState::Broken,
        ];

        for state in states {
            assert_eq!(
                state.status().is_completed(),
                state.conclusion().is_some(),
                "{state:?}"
            );
        }
    }
}
