use std::{net::SocketAddr, path::PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use domain::CheckRunId;
use source_control::github::DEFAULT_API_URL;

pub const APP_ID_ENV_VAR: &str = "GITHUB_APP_AUTH_ID";
pub const PRIVATE_KEY_ENV_VAR: &str = "GITHUB_APP_AUTH_KEY";
pub const WEBHOOK_SECRET_ENV_VAR: &str = "BUILDKITE_WEBHOOK_SECRET";

#[derive(Parser)]
#[command(name = "ghapp")]
#[command(about = "Authenticate as a GitHub app and report CI jobs as check runs")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub app: AppArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// `git credential-github-app-auth <get|store|erase>`
#[derive(Parser)]
#[command(name = "git-credential-github-app-auth")]
#[command(about = "git-credential helper issuing GitHub app installation tokens")]
#[command(version)]
pub struct CredentialCli {
    #[command(flatten)]
    pub app: AppArgs,

    #[command(subcommand)]
    pub command: CredentialCommands,
}

#[derive(clap::Args)]
pub struct AppArgs {
    /// Integer app id, or path to a file containing the id
    #[arg(long = "app_id", global = true, env = APP_ID_ENV_VAR)]
    pub app_id: Option<String>,

    /// App private key, or path to the private key file
    #[arg(
        long = "private_key",
        global = true,
        env = PRIVATE_KEY_ENV_VAR,
        hide_env_values = true
    )]
    pub private_key: Option<String>,

    /// GitHub api base url
    #[arg(long = "api_url", global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// '-v' for logging, '-vv' for debug logging (also $GITHUB_APP_AUTH_DEBUG)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve app id/key and check app authentication
    Current,
    /// Generate an access token for an installation
    Token {
        /// Account (user or organization) the app is installed on
        account: String,
    },
    /// git-credential helper implementation
    Credential {
        #[command(subcommand)]
        command: CredentialCommands,
    },
    /// GitHub checks api support
    Check {
        #[command(subcommand)]
        command: CheckCommands,
    },
    /// Receive Buildkite job webhooks and mirror them as check runs
    Serve(ServeArgs),
}

#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Print credentials for the repository git asks about
    Get {
        /// Account to issue the token for, instead of the one in the url path
        #[arg(long)]
        account: Option<String>,
    },
    /// no-op git-credential interface
    Store,
    /// no-op git-credential interface
    Erase,
}

#[derive(Subcommand)]
pub enum CheckCommands {
    /// List current checks on given repo ref
    List {
        repo: String,
        #[arg(value_name = "REF")]
        git_ref: String,
    },
    /// Push a new in-progress check
    Push(PushArgs),
    /// Mark an existing check as in progress
    Update {
        repo: String,
        id: CheckRunId,
        name: String,
    },
    /// Create or update the check run of the Buildkite job running this command
    FromJobEnv(OutputArgs),
    /// Create or update a check run from a Buildkite job webhook payload
    FromJobHook {
        /// Payload file, or '-' for stdin
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args)]
pub struct PushArgs {
    pub repo: String,
    pub branch: String,
    pub name: String,
    /// Commit to attach the check to, defaults to the head of the branch
    #[arg(long)]
    pub sha: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Values naming an existing file are replaced by the file's contents.
#[derive(clap::Args, Default)]
pub struct OutputArgs {
    #[arg(long = "output_title")]
    pub output_title: Option<String>,
    #[arg(long = "output_summary")]
    pub output_summary: Option<String>,
    #[arg(long = "output")]
    pub output: Option<String>,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    #[arg(long, env = "GHAPP_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Webhook token or signature secret, or path to a file containing it
    #[arg(long = "webhook_secret", env = WEBHOOK_SECRET_ENV_VAR, hide_env_values = true)]
    pub webhook_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_should_be_well_formed() {
        Cli::command().debug_assert();
        CredentialCli::command().debug_assert();
    }

    #[test]
    fn cli_should_parse_check_update() {
        let cli = Cli::try_parse_from([
            "ghapp",
            "--app_id",
            "1234",
            "check",
            "update",
            "asford/test_checks",
            "55",
            "Sleepy",
        ])
        .unwrap();

        assert_eq!(cli.app.app_id.as_deref(), Some("1234"));
        let Commands::Check {
            command: CheckCommands::Update { repo, id, name },
        } = cli.command
        else {
            panic!("expected check update");
        };
        assert_eq!(repo, "asford/test_checks");
        assert_eq!(id, CheckRunId(55));
        assert_eq!(name, "Sleepy");
    }

    #[test]
    fn cli_should_parse_from_job_env_with_output() {
        let cli = Cli::try_parse_from([
            "ghapp",
            "check",
            "from-job-env",
            "--output_title",
            "Tests",
            "--output_summary",
            "all green",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.app.verbose, 2);
        let Commands::Check {
            command: CheckCommands::FromJobEnv(output),
        } = cli.command
        else {
            panic!("expected check from-job-env");
        };
        assert_eq!(output.output_title.as_deref(), Some("Tests"));
        assert_eq!(output.output_summary.as_deref(), Some("all green"));
        assert_eq!(output.output, None);
    }

    #[test]
    fn cli_should_reject_non_numeric_check_id() {
        let result = Cli::try_parse_from(["ghapp", "check", "update", "a/b", "abc", "name"]);

        assert!(result.is_err());
    }

    #[test]
    fn credential_cli_should_parse_get() {
        let cli =
            CredentialCli::try_parse_from(["git-credential-github-app-auth", "get"]).unwrap();

        assert!(matches!(cli.command, CredentialCommands::Get { account: None }));
    }
}
