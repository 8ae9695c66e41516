mod checksum;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    App,
    api::RequestState,
    error::Result,
    orchestrator::{installation_checks, sync_job_hook},
};

use checksum::VerifiedBody;
use domain::{RepoName, RunDetails, buildkite::JobHook};

pub async fn handle_webhook(
    State(RequestState { app, secret }): State<RequestState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let body = match checksum::verify(&headers, body, &secret) {
        Ok(body) => body,
        Err(message) => {
            tracing::warn!("Rejected webhook delivery: {message}");
            return (StatusCode::UNAUTHORIZED, message);
        }
    };

    let hook = match parse_job_hook(&headers, &body) {
        Ok(Some(hook)) => hook,
        Ok(None) => return (StatusCode::NO_CONTENT, "OK"),
        Err(message) => return (StatusCode::BAD_REQUEST, message),
    };

    let Ok(repo) = RepoName::parse(&hook.pipeline.repository) else {
        tracing::warn!(
            "Ignoring job {} of unsupported repository {}",
            hook.job.id,
            hook.pipeline.repository
        );
        return (StatusCode::UNPROCESSABLE_ENTITY, "Unsupported repository");
    };

    tracing::info!("Handling {} for job {} on {repo}", hook.event, hook.job.id);

    match report_job(&app, &repo, &hook).await {
        Ok(run) => {
            tracing::info!("Check run {:?} is {:?}", run.id, run.status);
            (StatusCode::OK, "OK")
        }
        Err(e) => {
            tracing::error!("Failed to update check run for job {}: {e}", hook.job.id);
            (StatusCode::BAD_GATEWAY, "Failed to update check run")
        }
    }
}

async fn report_job(app: &App, repo: &RepoName, hook: &JobHook) -> Result<RunDetails> {
    let checks = installation_checks(app, repo).await?;

    sync_job_hook(&checks, hook, None).await
}

fn parse_job_hook(
    headers: &HeaderMap,
    body: &VerifiedBody,
) -> core::result::Result<Option<JobHook>, &'static str> {
    let event = headers.get("x-buildkite-event");
    let event = event.ok_or("Missing header x-buildkite-event")?;
    let event = event.to_str().map_err(|_| "Failed to parse event")?;

    if !event.starts_with("job.") {
        tracing::debug!("Ignoring {event} event");
        return Ok(None);
    }

    let hook = JobHook::from_json(body.as_str()).map_err(|e| {
        tracing::warn!("{e}");
        "Failed to parse payload"
    })?;

    Ok(Some(hook))
}
