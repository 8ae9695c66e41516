use std::path::Path;

use chrono::{SubsecRound, Utc};
use domain::{
    CheckAction, Output, RepoName, RunDetails, Status,
    buildkite::{JobEnviron, JobHook},
};
use source_control::{CheckRuns, apply};
use tokio::io::AsyncReadExt;

use crate::{
    cli::{AppArgs, CheckCommands, OutputArgs, PushArgs},
    config::read_if_file,
    error::{CommandError, Result},
    orchestrator::{installation_checks, sync_job_environ, sync_job_hook},
};

use super::load_app;

pub async fn run(args: &AppArgs, command: CheckCommands) -> Result<()> {
    let run = match command {
        CheckCommands::List { repo, git_ref } => return list(args, &repo, &git_ref).await,
        CheckCommands::Push(push_args) => push(args, push_args).await?,
        CheckCommands::Update { repo, id, name } => {
            let repo = RepoName::parse(&repo)?;
            let mut run = RunDetails::new(name, Status::InProgress);
            run.id = Some(id);

            let app = load_app(args)?;
            let checks = installation_checks(&app, &repo).await?;
            apply(&checks, &CheckAction::UpdateRun { repo, run }).await?
        }
        CheckCommands::FromJobEnv(output) => {
            // Environment problems are reported before any credentials are touched.
            let job = JobEnviron::from_environment()?;
            let output = load_output(&output)?;
            let repo = RepoName::parse(&job.repository)?;

            let app = load_app(args)?;
            let checks = installation_checks(&app, &repo).await?;
            sync_job_environ(&checks, &job, output).await?
        }
        CheckCommands::FromJobHook { file, output } => {
            let hook = JobHook::from_json(&read_payload(&file).await?)?;
            let output = load_output(&output)?;
            let repo = RepoName::parse(&hook.pipeline.repository)?;

            let app = load_app(args)?;
            let checks = installation_checks(&app, &repo).await?;
            sync_job_hook(&checks, &hook, output).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&run)?);

    Ok(())
}

async fn list(args: &AppArgs, repo: &str, git_ref: &str) -> Result<()> {
    let repo = RepoName::parse(repo)?;
    let app = load_app(args)?;
    let checks = installation_checks(&app, &repo).await?;

    let runs = checks.list_runs(&repo.owner, &repo.repo, git_ref).await?;

    println!("{}", serde_json::to_string_pretty(&runs)?);

    Ok(())
}

async fn push(args: &AppArgs, push_args: PushArgs) -> Result<RunDetails> {
    let PushArgs {
        repo,
        branch,
        name,
        sha,
        output,
    } = push_args;

    let repo = RepoName::parse(&repo)?;
    let output = load_output(&output)?;

    let app = load_app(args)?;
    let checks = installation_checks(&app, &repo).await?;

    let sha = match sha {
        Some(sha) => sha,
        None => {
            let sha = checks
                .resolve_branch_sha(&repo.owner, &repo.repo, &branch)
                .await?;
            tracing::info!("Resolved {repo}@{branch} to {sha}");
            sha
        }
    };

    let mut run = RunDetails::new(name, Status::InProgress);
    run.head_sha = Some(sha);
    run.head_branch = Some(branch);
    run.started_at = Some(Utc::now().trunc_subsecs(0));
    run.output = output;

    Ok(apply(&checks, &CheckAction::CreateRun { repo, run }).await?)
}

/// Reads the payload from `file`, or from stdin for `-`.
async fn read_payload(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut payload = String::new();
        tokio::io::stdin().read_to_string(&mut payload).await?;
        Ok(payload)
    } else {
        Ok(tokio::fs::read_to_string(file).await?)
    }
}

/// Builds the run output from the `--output*` flags. A title needs a
/// summary, and neither summary nor text mean anything without a title.
pub fn load_output(args: &OutputArgs) -> Result<Option<Output>> {
    let read = |value: &Option<String>| value.as_deref().map(read_if_file).transpose();

    let title = read(&args.output_title)?;
    let summary = read(&args.output_summary)?;
    let text = read(&args.output)?;

    match (title, summary) {
        (Some(title), Some(summary)) => Ok(Some(Output::new(title, summary, text))),
        (Some(_), None) => Err(CommandError::Configuration(
            "--output_title requires --output_summary".to_owned(),
        )),
        (None, None) if text.is_none() => Ok(None),
        (None, _) => Err(CommandError::Configuration(
            "--output_summary and --output require --output_title".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_args(title: Option<&str>, summary: Option<&str>, text: Option<&str>) -> OutputArgs {
        OutputArgs {
            output_title: title.map(str::to_owned),
            output_summary: summary.map(str::to_owned),
            output: text.map(str::to_owned),
        }
    }

    #[test]
    fn load_output_should_return_none_without_flags() {
        assert_eq!(load_output(&OutputArgs::default()).unwrap(), None);
    }

    #[test]
    fn load_output_should_build_output() {
        let output = load_output(&output_args(Some("Tests"), Some("all green"), Some("42 passed")))
            .unwrap();

        assert_eq!(
            output,
            Some(Output::new("Tests", "all green", Some("42 passed".to_owned())))
        );
    }

    #[test]
    fn load_output_should_read_summary_from_file() {
        let path = std::env::temp_dir().join(format!("ghapp-{}-summary.md", std::process::id()));
        std::fs::write(&path, "# Report\n").unwrap();

        let output =
            load_output(&output_args(Some("Tests"), path.to_str(), None)).unwrap().unwrap();

        assert_eq!(output.summary.as_deref(), Some("# Report\n"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn load_output_should_require_summary_with_title() {
        let result = load_output(&output_args(Some("Tests"), None, None));

        assert!(matches!(result, Err(CommandError::Configuration(_))));
    }

    #[test]
    fn load_output_should_require_title_with_text() {
        let result = load_output(&output_args(None, None, Some("42 passed")));

        assert!(matches!(result, Err(CommandError::Configuration(_))));
    }
}
