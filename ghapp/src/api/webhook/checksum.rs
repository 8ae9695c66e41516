use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

/// Accepts a delivery signed with `X-Buildkite-Signature`, or carrying the
/// shared secret in `X-Buildkite-Token`.
pub fn verify(
    headers: &HeaderMap,
    body: String,
    secret: &SecretString,
) -> Result<VerifiedBody, &'static str> {
    if let Some(signature) = headers.get("x-buildkite-signature") {
        let signature = signature
            .to_str()
            .map_err(|_| "Failed to parse x-buildkite-signature header")?;

        verify_signature(signature, &body, secret)?;
    } else if let Some(token) = headers.get("x-buildkite-token") {
        verify_token(token.as_bytes(), secret)?;
    } else {
        return Err("Missing header x-buildkite-signature or x-buildkite-token");
    }

    Ok(VerifiedBody { body })
}

fn verify_signature(signature: &str, body: &str, secret: &SecretString) -> Result<(), &'static str> {
    let mut timestamp = None;
    let mut expected_signature = None;

    for part in signature.split(',') {
        match part.trim().split_once('=') {
            Some(("timestamp", value)) => timestamp = Some(value),
            Some(("signature", value)) => expected_signature = Some(value),
            _ => {}
        }
    }

    let (timestamp, expected_signature) = timestamp
        .zip(expected_signature)
        .ok_or("Malformed x-buildkite-signature header")?;

    let expected_signature =
        hex::decode(expected_signature).map_err(|_| "Failed to parse sha256 signature")?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| "Failed to hash payload")?;

    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());

    mac.verify_slice(expected_signature.as_slice())
        .map_err(|_| "Failed to verify sha256 signature")
}

fn verify_token(token: &[u8], secret: &SecretString) -> Result<(), &'static str> {
    let secret = secret.expose_secret().as_bytes();

    // Compare through the mac so the comparison time doesn't leak the secret.
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| "Failed to hash token")?;
    mac.update(secret);
    let expected = mac.finalize().into_bytes();

    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| "Failed to hash token")?;
    mac.update(token);

    mac.verify_slice(&expected)
        .map_err(|_| "Invalid x-buildkite-token")
}

#[derive(PartialEq, Eq, Debug)]
pub struct VerifiedBody {
    body: String,
}

impl VerifiedBody {
    pub fn as_str(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
impl VerifiedBody {
    pub fn from_static(str: &'static str) -> VerifiedBody {
        VerifiedBody {
            body: str.to_owned(),
        }
    }
}
