mod app;
mod check;
mod credential;

use std::sync::Arc;

use crate::{
    App,
    api::Server,
    cli::{AppArgs, Commands, ServeArgs},
    config::{GitHubConfig, WebhookConfig},
    error::Result,
};

pub use credential::run as run_credential;

pub async fn run(args: &AppArgs, command: Commands) -> Result<()> {
    match command {
        Commands::Current => app::current(&load_app(args)?).await,
        Commands::Token { account } => app::token(&load_app(args)?, &account).await,
        Commands::Credential { command } => credential::run(args, command).await,
        Commands::Check { command } => check::run(args, command).await,
        Commands::Serve(serve) => self::serve(args, &serve).await,
    }
}

/// Resolves app id and key. Commands call this only once they know they
/// need to talk to the platform.
fn load_app(args: &AppArgs) -> Result<App> {
    GitHubConfig::from_args(args)?.build_app()
}

async fn serve(args: &AppArgs, serve: &ServeArgs) -> Result<()> {
    let webhook = WebhookConfig::from_args(serve)?;
    let app = Arc::new(load_app(args)?);

    Server::new(app, webhook).start().await?;

    Ok(())
}
