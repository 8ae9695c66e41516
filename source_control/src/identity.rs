use std::{collections::HashMap, fmt::Display, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use http::{
    HeaderMap, HeaderValue,
    header::{ACCEPT, AUTHORIZATION},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    TokenExchange,
    error::{GitHubError, Result},
};

/// The platform rejects assertions valid for longer than ten minutes.
const ASSERTION_LIFETIME_SECONDS: i64 = 10 * 60;
/// Cached installation tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Claims {
    pub iat: i64,
    pub exp: i64,
    pub iss: u64,
}

pub struct AppIdentity {
    app_id: u64,
    key: EncodingKey,
}

impl std::fmt::Debug for AppIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppIdentity")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl AppIdentity {
    /// Fails when the key is not a usable RSA private key, before any
    /// request is made.
    pub fn new(app_id: u64, private_key: &SecretString) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(private_key.expose_secret().as_bytes())
            .map_err(|e| GitHubError::Configuration(format!("invalid private key: {e}")))?;

        let identity = Self { app_id, key };
        identity
            .assertion_at(Utc::now())
            .map_err(|e| GitHubError::Configuration(format!("unable to sign with private key: {e}")))?;

        Ok(identity)
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    pub fn assertion_at(&self, now: DateTime<Utc>) -> Result<SecretString> {
        let iat = now.timestamp();
        let claims = Claims {
            iat,
            exp: iat + ASSERTION_LIFETIME_SECONDS,
            iss: self.app_id,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)?;

        Ok(SecretString::new(token))
    }

    /// Headers authenticating as the app itself, signed afresh on every call.
    pub fn app_headers(&self) -> Result<HeaderMap> {
        bearer_headers(&self.assertion_at(Utc::now())?)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct InstallationId(pub u64);

impl Display for InstallationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct InstallationToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(EXPIRY_MARGIN_SECONDS)
    }
}

pub fn bearer_headers(token: &SecretString) -> Result<HeaderMap> {
    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert(
        "x-github-api-version",
        HeaderValue::from_static("2022-11-28"),
    );

    Ok(headers)
}

type TokenSlot = Arc<Mutex<Option<InstallationToken>>>;

/// An app identity together with the installation tokens issued to it.
///
/// Tokens are cached per account for the lifetime of this value and
/// exchanged again once they come within a minute of expiring. Each account
/// has its own slot, so an exchange in flight only holds up callers asking
/// for the same account.
pub struct GitHubApp<X> {
    identity: AppIdentity,
    exchange: X,
    tokens: Mutex<HashMap<String, TokenSlot>>,
}

impl<X> GitHubApp<X>
where
    X: TokenExchange,
{
    pub fn new(identity: AppIdentity, exchange: X) -> Self {
        Self {
            identity,
            exchange,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    pub fn exchange(&self) -> &X {
        &self.exchange
    }

    pub fn app_headers(&self) -> Result<HeaderMap> {
        self.identity.app_headers()
    }

    pub async fn installation_token_for(&self, account: &str) -> Result<SecretString> {
        let slot = {
            let mut tokens = self.tokens.lock().await;
            Arc::clone(tokens.entry(account.to_owned()).or_default())
        };
        let mut slot = slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh_at(Utc::now()) {
                tracing::debug!("Reusing installation token for {account}");
                return Ok(cached.token.clone());
            }
            tracing::debug!("Installation token for {account} is about to expire");
        }

        let app_headers = self.app_headers()?;
        let installation = self.exchange.find_installation(&app_headers, account).await?;
        let token = self
            .exchange
            .create_access_token(&app_headers, installation)
            .await?;

        tracing::info!(
            "Issued installation token for {account} (installation {installation}), expires at {}",
            token.expires_at
        );

        let secret = token.token.clone();
        *slot = Some(token);

        Ok(secret)
    }

    pub async fn installation_headers(&self, account: &str) -> Result<HeaderMap> {
        bearer_headers(&self.installation_token_for(account).await?)
    }
}
