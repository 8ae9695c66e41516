//! The `get` side of git's credential helper protocol.
//!
//! See <https://git-scm.com/docs/git-credential>.

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const TOKEN_USERNAME: &str = "x-access-token";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CredentialRequest {
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub username: Option<String>,
}

impl CredentialRequest {
    /// Reads `key=value` lines up to the first blank line or end of input.
    pub async fn read<R>(reader: R) -> std::io::Result<Self>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut request = CredentialRequest::default();
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                break;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!("Ignoring credential line without '=': {line}");
                continue;
            };

            let value = Some(value.to_owned());
            match key {
                "protocol" => request.protocol = value,
                "host" => request.host = value,
                "path" => request.path = value,
                "username" => request.username = value,
                _ => {}
            }
        }

        Ok(request)
    }

    /// The owner segment of `path`, which git only sends when
    /// `credential.useHttpPath` is enabled.
    pub fn account(&self) -> Option<&str> {
        self.path
            .as_deref()
            .map(|path| path.trim_start_matches('/'))
            .and_then(|path| path.split('/').next())
            .filter(|account| !account.is_empty())
    }
}

pub fn format_credentials(token: &SecretString) -> String {
    format!(
        "username={TOKEN_USERNAME}\npassword={}\n",
        token.expose_secret()
    )
}
