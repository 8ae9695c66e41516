use std::future::Future;

use domain::{CheckAction, CheckRunId, RepoName, RunDetails};
use http::HeaderMap;

pub mod error;
pub mod github;
pub mod identity;

pub use error::{GitHubError, Result};
pub use identity::{AppIdentity, GitHubApp, InstallationId, InstallationToken};

/// Turns an app-level assertion into installation credentials.
pub trait TokenExchange: Send + Sync {
    fn find_installation(
        &self,
        app_headers: &HeaderMap,
        account: &str,
    ) -> impl Future<Output = Result<InstallationId>> + Send;
    fn create_access_token(
        &self,
        app_headers: &HeaderMap,
        installation: InstallationId,
    ) -> impl Future<Output = Result<InstallationToken>> + Send;
}

/// The check run endpoints, already authenticated for one installation.
pub trait CheckRuns: Send + Sync {
    fn list_runs(
        &self,
        owner: &str,
        repo: &str,
        r#ref: &str,
    ) -> impl Future<Output = Result<Vec<RunDetails>>> + Send;
    fn create_run(
        &self,
        owner: &str,
        repo: &str,
        run: &RunDetails,
    ) -> impl Future<Output = Result<RunDetails>> + Send;
    fn update_run(
        &self,
        owner: &str,
        repo: &str,
        id: CheckRunId,
        run: &RunDetails,
    ) -> impl Future<Output = Result<RunDetails>> + Send;
}

/// Executes a reconciled action, refusing runs that break the
/// status/conclusion invariants before anything is sent.
pub async fn apply<C>(checks: &C, action: &CheckAction) -> Result<RunDetails>
where
    C: CheckRuns,
{
    let run = action.run();
    run.validate()?;

    let RepoName { owner, repo } = action.repo();

    match action {
        CheckAction::CreateRun { .. } => {
            tracing::info!("Creating check run \"{}\" on {owner}/{repo}", run.name);
            checks.create_run(owner, repo, run).await
        }
        CheckAction::UpdateRun { .. } => {
            let id = run.id.ok_or_else(|| {
                GitHubError::Generic(format!("Check run \"{}\" has no id to update", run.name))
            })?;
            tracing::info!("Updating check run {id} \"{}\" on {owner}/{repo}", run.name);
            checks.update_run(owner, repo, id, run).await
        }
    }
}
