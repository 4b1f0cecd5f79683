//! OpenID Connect domain types shared by the login flows.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const STATE_BYTES: usize = 32;
const NONCE_BYTES: usize = 32;

/// Failure to draw random bytes from the operating system.
#[derive(Debug, Error)]
#[error("os rng error: {message}")]
pub struct EntropyError {
    pub message: String,
}

/// Returns a fresh opaque `state` value for one authorization request.
pub fn new_state() -> Result<String, EntropyError> {
    random_urlsafe(STATE_BYTES)
}

/// Returns a fresh opaque `nonce` value for one authorization request.
pub fn new_nonce() -> Result<String, EntropyError> {
    random_urlsafe(NONCE_BYTES)
}

fn random_urlsafe(len: usize) -> Result<String, EntropyError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| EntropyError {
            message: err.to_string(),
        })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Tokens returned by a successful grant.
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// The raw signed ID token.
    pub id_token: String,
    /// Claims decoded from the ID token payload.
    pub id_token_claims: IdTokenClaims,
    /// Refresh token, if the provider issued one.
    pub refresh_token: Option<String>,
}

/// Claims asserted by the ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer identifier.
    pub iss: String,

    /// Subject (unique user ID).
    pub sub: String,

    /// Audience; must contain the client ID.
    pub aud: StringOrVec,

    /// Expiration time (Unix timestamp).
    pub exp: u64,

    /// Issued-at time (Unix timestamp).
    pub iat: u64,

    /// Nonce echoed back from the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// User's email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// User's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Any further claims the provider included.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Helper type for the `aud` claim which can be a string or an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrVec {
    String(String),
    Vec(Vec<String>),
}

impl StringOrVec {
    /// Check if the audience contains a specific value.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            StringOrVec::String(s) => s == value,
            StringOrVec::Vec(v) => v.iter().any(|s| s == value),
        }
    }
}
