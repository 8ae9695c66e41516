use std::collections::HashMap;

use thiserror::Error;

use crate::models::Conclusion;

pub const REPO: &str = "BUILDKITE_REPO";
pub const COMMIT: &str = "BUILDKITE_COMMIT";
pub const JOB_ID: &str = "BUILDKITE_JOB_ID";
pub const BRANCH: &str = "BUILDKITE_BRANCH";
pub const BUILD_ID: &str = "BUILDKITE_BUILD_ID";
pub const BUILD_URL: &str = "BUILDKITE_BUILD_URL";
pub const LABEL: &str = "BUILDKITE_LABEL";
pub const EXIT_STATUS: &str = "BUILDKITE_COMMAND_EXIT_STATUS";
pub const TIMEOUT: &str = "BUILDKITE_TIMEOUT";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Text,
    Integer,
}

struct Variable {
    name: &'static str,
    required: bool,
    kind: Kind,
}

const SCHEMA: &[Variable] = &[
    Variable { name: REPO, required: true, kind: Kind::Text },
    Variable { name: COMMIT, required: true, kind: Kind::Text },
    Variable { name: JOB_ID, required: true, kind: Kind::Text },
    Variable { name: BRANCH, required: false, kind: Kind::Text },
    Variable { name: BUILD_ID, required: false, kind: Kind::Text },
    Variable { name: BUILD_URL, required: false, kind: Kind::Text },
    Variable { name: LABEL, required: false, kind: Kind::Text },
    Variable { name: EXIT_STATUS, required: false, kind: Kind::Integer },
    Variable { name: TIMEOUT, required: false, kind: Kind::Text },
];

/// Exit status the agent reports for a command it had to kill.
const KILLED_EXIT_STATUS: i32 = -1;

/// Snapshot of the variables identifying the job running in this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobEnviron {
    pub repository: String,
    pub commit: String,
    pub job_id: String,
    pub branch: Option<String>,
    pub build_id: Option<String>,
    pub build_url: Option<String>,
    pub label: Option<String>,
    /// Absent while the command is still running.
    pub exit_status: Option<i32>,
    pub timeout: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariableProblem {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} must be an integer, got \"{value}\"")]
    NotAnInteger { name: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid job environment: {}", describe(.problems))]
pub struct EnvironmentError {
    pub problems: Vec<VariableProblem>,
}

fn describe(problems: &[VariableProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl JobEnviron {
    pub fn from_environment() -> Result<Self, EnvironmentError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, EnvironmentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();

        let problems: Vec<_> = SCHEMA
            .iter()
            .filter_map(|variable| match (vars.get(variable.name), variable.kind) {
                (None, _) if variable.required => Some(VariableProblem::Missing(variable.name)),
                (Some(value), Kind::Integer) if value.trim().parse::<i32>().is_err() => {
                    Some(VariableProblem::NotAnInteger {
                        name: variable.name,
                        value: value.clone(),
                    })
                }
                _ => None,
            })
            .collect();

        if !problems.is_empty() {
            return Err(EnvironmentError { problems });
        }

        let text = |name: &str| vars.get(name).map(|value| value.trim().to_owned());

        Ok(JobEnviron {
            repository: text(REPO).unwrap_or_default(),
            commit: text(COMMIT).unwrap_or_default(),
            job_id: text(JOB_ID).unwrap_or_default(),
            branch: text(BRANCH),
            build_id: text(BUILD_ID),
            build_url: text(BUILD_URL),
            label: text(LABEL),
            exit_status: text(EXIT_STATUS).and_then(|value| value.parse().ok()),
            timeout: text(TIMEOUT),
        })
    }

    pub fn run_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.job_id)
    }

    pub fn details_url(&self) -> Option<String> {
        self.build_url
            .as_ref()
            .map(|build_url| format!("{build_url}#{}", self.job_id))
    }

    pub fn timeout_configured(&self) -> bool {
        self.timeout
            .as_deref()
            .is_some_and(|timeout| !timeout.eq_ignore_ascii_case("false"))
    }

    /// `None` while the command is still running.
    pub fn conclusion(&self) -> Option<Conclusion> {
        self.exit_status.map(|exit_status| match exit_status {
            0 => Conclusion::Success,
            KILLED_EXIT_STATUS if self.timeout_configured() => Conclusion::TimedOut,
            _ => Conclusion::Failure,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn job_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("BUILDKITE", "true"),
            ("CI", "true"),
            (REPO, "https://github.com/asford/test_checks"),
            (COMMIT, "df998e034720a29ecc301e3d1cc80a3dad085492"),
            (JOB_ID, "c498dd9c-77d0-42de-be6d-811d9c5156cc"),
            (BRANCH, "master"),
            (BUILD_ID, "deefbbee-3bca-476f-b411-ae5d5573c11c"),
            (
                BUILD_URL,
                "https://buildkite.com/uw-ipd/test-checks/builds/15",
            ),
            (LABEL, "Sleepy"),
            (TIMEOUT, "false"),
        ]
    }

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut vars = job_vars();
        vars.retain(|(key, _)| !extra.iter().any(|(name, _)| name == key));
        vars.extend_from_slice(extra);
        vars
    }

    #[test]
    fn from_vars_should_load_running_job() {
        let job = JobEnviron::from_vars(job_vars()).unwrap();

        assert_eq!(job.repository, "https://github.com/asford/test_checks");
        assert_eq!(job.commit, "df998e034720a29ecc301e3d1cc80a3dad085492");
        assert_eq!(job.job_id, "c498dd9c-77d0-42de-be6d-811d9c5156cc");
        assert_eq!(job.branch.as_deref(), Some("master"));
        assert_eq!(job.run_name(), "Sleepy");
        assert_eq!(job.exit_status, None);
        assert_eq!(job.conclusion(), None);
        assert_eq!(
            job.details_url().as_deref(),
            Some(
                "https://buildkite.com/uw-ipd/test-checks/builds/15#c498dd9c-77d0-42de-be6d-811d9c5156cc"
            )
        );
    }

    #[test]
    fn from_vars_should_report_all_missing_required_variables() {
        let vars = job_vars()
            .into_iter()
            .filter(|(key, _)| *key != REPO && *key != JOB_ID);

        let error = JobEnviron::from_vars(vars).unwrap_err();

        assert_eq!(
            error.problems,
            vec![VariableProblem::Missing(REPO), VariableProblem::Missing(JOB_ID)]
        );
        assert_eq!(
            error.to_string(),
            "Invalid job environment: BUILDKITE_REPO is not set, BUILDKITE_JOB_ID is not set"
        );
    }

    #[test]
    fn from_vars_should_treat_empty_values_as_missing() {
        let error = JobEnviron::from_vars(with(&[(COMMIT, "  ")])).unwrap_err();

        assert_eq!(error.problems, vec![VariableProblem::Missing(COMMIT)]);
    }

    #[test]
    fn from_vars_should_reject_non_integer_exit_status() {
        let error = JobEnviron::from_vars(with(&[(EXIT_STATUS, "oops")])).unwrap_err();

        assert_eq!(
            error.problems,
            vec![VariableProblem::NotAnInteger {
                name: EXIT_STATUS,
                value: "oops".to_owned()
            }]
        );
    }

    #[test]
    fn from_vars_should_treat_empty_exit_status_as_running() {
        let job = JobEnviron::from_vars(with(&[(EXIT_STATUS, "")])).unwrap();

        assert_eq!(job.exit_status, None);
    }

    #[test]
    fn conclusion_should_follow_exit_status() {
        let passed = JobEnviron::from_vars(with(&[(EXIT_STATUS, "0")])).unwrap();
        let failed = JobEnviron::from_vars(with(&[(EXIT_STATUS, "17")])).unwrap();
        let killed = JobEnviron::from_vars(with(&[(EXIT_STATUS, "-1")])).unwrap();

        assert_eq!(passed.conclusion(), Some(Conclusion::Success));
        assert_eq!(failed.conclusion(), Some(Conclusion::Failure));
        assert_eq!(killed.conclusion(), Some(Conclusion::Failure));
    }

    #[test]
    fn conclusion_should_be_timed_out_when_killed_with_timeout() {
        let job =
            JobEnviron::from_vars(with(&[(EXIT_STATUS, "-1"), (TIMEOUT, "1")])).unwrap();

        assert!(job.timeout_configured());
        assert_eq!(job.conclusion(), Some(Conclusion::TimedOut));
    }

    #[test]
    fn run_name_should_fall_back_to_job_id() {
        let vars = job_vars().into_iter().filter(|(key, _)| *key != LABEL);

        let job = JobEnviron::from_vars(vars).unwrap();

        assert_eq!(job.run_name(), "c498dd9c-77d0-42de-be6d-811d9c5156cc");
    }
}
