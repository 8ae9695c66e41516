use std::process::ExitCode;

use clap::Parser;
use ghapp::{cli::Cli, commands, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.app.verbose) {
        eprintln!("Failed to install logger: {e}");
    }

    match commands::run(&cli.app, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
