use chrono::Utc;
use domain::{
    CheckAction, Output, ParseError, RepoName, RunDetails,
    buildkite::{JobEnviron, JobHook},
    job_environ_to_check_action, job_hook_to_check_action,
};
use source_control::{CheckRuns, apply, github::GitHubChecks};

use crate::{App, error::Result};

/// Check run client authenticated for the installation owning `repo`.
pub async fn installation_checks(app: &App, repo: &RepoName) -> Result<GitHubChecks> {
    let headers = app.installation_headers(&repo.owner).await?;

    Ok(app.exchange().checks(&headers)?)
}

/// Lists the runs on `head_sha`, lets `plan` decide what to do about them and
/// applies the result. The listing always completes before anything is
/// written.
pub async fn sync_check_run<C, F>(
    checks: &C,
    repo: &RepoName,
    head_sha: &str,
    output: Option<Output>,
    plan: F,
) -> Result<RunDetails>
where
    C: CheckRuns,
    F: FnOnce(&[RunDetails]) -> core::result::Result<CheckAction, ParseError> + Send,
{
    let current_runs = checks.list_runs(&repo.owner, &repo.repo, head_sha).await?;
    tracing::info!("Found {} check runs on {repo}@{head_sha}", current_runs.len());

    let mut action = plan(current_runs.as_slice())?;
    if output.is_some() {
        action.run_mut().output = output;
    }
    tracing::debug!("Resolved action {action:?}");

    Ok(apply(checks, &action).await?)
}

pub async fn sync_job_environ<C>(
    checks: &C,
    job: &JobEnviron,
    output: Option<Output>,
) -> Result<RunDetails>
where
    C: CheckRuns,
{
    let repo = RepoName::parse(&job.repository)?;

    sync_check_run(checks, &repo, &job.commit, output, |runs| {
        job_environ_to_check_action(job, runs, Utc::now())
    })
    .await
}

pub async fn sync_job_hook<C>(
    checks: &C,
    hook: &JobHook,
    output: Option<Output>,
) -> Result<RunDetails>
where
    C: CheckRuns,
{
    let repo = RepoName::parse(&hook.pipeline.repository)?;

    sync_check_run(checks, &repo, &hook.build.commit, output, |runs| {
        job_hook_to_check_action(hook, runs, Utc::now())
    })
    .await
}
