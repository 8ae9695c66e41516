use secrecy::ExposeSecret;

use crate::{App, error::Result};

pub async fn current(app: &App) -> Result<()> {
    let details = app.exchange().current_app(&app.app_headers()?).await?;

    println!("{}", serde_json::to_string_pretty(&details)?);

    Ok(())
}

pub async fn token(app: &App, account: &str) -> Result<()> {
    let token = app.installation_token_for(account).await?;

    println!("{}", token.expose_secret());

    Ok(())
}
