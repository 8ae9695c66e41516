//! Decides whether a CI job's status creates a new check run or updates the
//! one previously created for it.
//!
//! Everything here is pure: the current time is passed in and no network
//! access happens, so identical inputs always yield identical actions.

use chrono::{DateTime, SubsecRound, Utc};

use crate::{
    buildkite::{JobEnviron, JobHook},
    error::Result,
    models::{CheckAction, RepoName, RunDetails, Status},
};

pub fn job_environ_to_check_action(
    job: &JobEnviron,
    checks_for_commit: &[RunDetails],
    now: DateTime<Utc>,
) -> Result<CheckAction> {
    let repo = RepoName::parse(&job.repository)?;
    let run = job_environ_to_run_details(job, now);

    Ok(reconcile(repo, run, checks_for_commit))
}

pub fn job_environ_to_run_details(job: &JobEnviron, now: DateTime<Utc>) -> RunDetails {
    let now = now.trunc_subsecs(0);

    let (status, started_at, completed_at) = match job.conclusion() {
        None => (Status::InProgress, Some(now), None),
        Some(_) => (Status::Completed, None, Some(now)),
    };

    RunDetails {
        id: None,
        name: job.run_name().to_owned(),
        head_sha: Some(job.commit.clone()),
        head_branch: job.branch.clone(),
        details_url: job.details_url(),
        external_id: Some(job.job_id.clone()),
        status,
        conclusion: job.conclusion(),
        started_at,
        completed_at,
        output: None,
    }
}

pub fn job_hook_to_check_action(
    hook: &JobHook,
    checks_for_commit: &[RunDetails],
    now: DateTime<Utc>,
) -> Result<CheckAction> {
    let repo = RepoName::parse(&hook.pipeline.repository)?;
    let run = job_hook_to_run_details(hook, now);

    Ok(reconcile(repo, run, checks_for_commit))
}

pub fn job_hook_to_run_details(hook: &JobHook, now: DateTime<Utc>) -> RunDetails {
    let status = hook.job.state.status();
    let completed = status.is_completed();

    RunDetails {
        id: None,
        name: hook.run_name().to_owned(),
        head_sha: Some(hook.build.commit.clone()),
        head_branch: hook.build.branch.clone(),
        details_url: hook.job.web_url.clone(),
        external_id: Some(hook.job.id.clone()),
        status,
        conclusion: hook.job.state.conclusion(),
        started_at: hook.job.started_at,
        completed_at: completed
            .then(|| hook.job.finished_at.unwrap_or_else(|| now.trunc_subsecs(0))),
        output: None,
    }
}

fn reconcile(repo: RepoName, run: RunDetails, checks_for_commit: &[RunDetails]) -> CheckAction {
    let Some(external_id) = run.external_id.as_deref() else {
        return CheckAction::CreateRun { repo, run };
    };

    let mut ours = checks_for_commit
        .iter()
        .filter(|check| check.is_owned_by(external_id));

    match ours.next() {
        None => CheckAction::CreateRun { repo, run },
        Some(current) => {
            let duplicates = ours.count();
            if duplicates > 0 {
                tracing::warn!(
                    "Found {} check runs for job {external_id} on {repo}, updating the first ({:?})",
                    duplicates + 1,
                    current.id
                );
            }

            CheckAction::UpdateRun {
                repo,
                run: RunDetails {
                    id: current.id,
                    external_id: current.external_id.clone(),
                    head_sha: None,
                    head_branch: None,
                    ..run
                },
            }
        }
    }
}
