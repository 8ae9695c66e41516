use std::process::ExitCode;

use clap::Parser;
use ghapp::{cli::CredentialCli, commands, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CredentialCli::parse();
    if let Err(e) = logging::init(cli.app.verbose) {
        eprintln!("Failed to install logger: {e}");
    }

    match commands::run_credential(&cli.app, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
