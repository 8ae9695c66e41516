use tokio::io::{AsyncWriteExt, BufReader};

use crate::{
    cli::{AppArgs, CredentialCommands},
    credential::{CredentialRequest, format_credentials},
    error::{CommandError, Result},
};

use super::load_app;

pub async fn run(args: &AppArgs, command: CredentialCommands) -> Result<()> {
    match command {
        CredentialCommands::Get { account } => get(args, account).await,
        CredentialCommands::Store => discard("store").await,
        CredentialCommands::Erase => discard("erase").await,
    }
}

async fn get(args: &AppArgs, account: Option<String>) -> Result<()> {
    let request = CredentialRequest::read(BufReader::new(tokio::io::stdin())).await?;
    tracing::debug!("Credential request {request:?}");

    let account = account
        .or_else(|| request.account().map(str::to_owned))
        .ok_or_else(|| {
            CommandError::Configuration(
                "No account in credential request, enable credential.useHttpPath or pass --account"
                    .to_owned(),
            )
        })?;

    let app = load_app(args)?;
    let token = app.installation_token_for(&account).await?;

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format_credentials(&token).as_bytes())
        .await?;
    stdout.flush().await?;

    Ok(())
}

/// git writes the credential to us regardless; there is nothing to keep.
async fn discard(operation: &str) -> Result<()> {
    CredentialRequest::read(BufReader::new(tokio::io::stdin())).await?;
    tracing::debug!("Ignoring credential {operation}");

    Ok(())
}
