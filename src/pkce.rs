use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::oidc::EntropyError;

const VERIFIER_BYTES: usize = 32;

/// Code challenge transform negotiated with the provider.
///
/// Only `S256` is usable; the `plain` transform defeats the purpose of PKCE
/// and is never offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    S256,
}

impl CodeChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        "S256"
    }

    /// Parses a method identifier from provider metadata, dropping anything
    /// this client cannot use.
    pub fn parse(value: &str) -> Option<Self> {
        (value == "S256").then_some(Self::S256)
    }
}

#[derive(Debug, Error)]
pub enum PkceError {
    #[error("no usable code challenge method")]
    NoUsableMethod,

    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Proof-of-possession pair binding an authorization code to this process.
///
/// The verifier stays in memory and is only sent on the token exchange; the
/// challenge derived from it is what goes into the authorization URL.
#[derive(Debug, Clone)]
pub struct PkceParams {
    pub code_verifier: String,
    pub code_challenge: String,
    pub method: CodeChallengeMethod,
}

impl PkceParams {
    /// Negotiates a transform from the provider's advertised methods and
    /// generates a fresh verifier/challenge pair.
    pub fn new(methods: &[CodeChallengeMethod]) -> Result<Self, PkceError> {
        if !methods.contains(&CodeChallengeMethod::S256) {
            return Err(PkceError::NoUsableMethod);
        }
        let mut bytes = [0u8; VERIFIER_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| EntropyError {
                message: err.to_string(),
            })?;
        Ok(Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn from_verifier(code_verifier: impl Into<String>) -> Self {
        let code_verifier = code_verifier.into();
        let mut hasher = Sha256::new();
        hasher.update(code_verifier.as_bytes());
        let digest = hasher.finalize();
        let code_challenge = URL_SAFE_NO_PAD.encode(digest);
        Self {
            code_verifier,
            code_challenge,
            method: CodeChallengeMethod::S256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeChallengeMethod, PkceError, PkceParams};

    #[test]
    fn generates_url_safe_pkce() {
        let pkce = PkceParams::new(&[CodeChallengeMethod::S256]).unwrap();
        for value in [&pkce.code_verifier, &pkce.code_challenge] {
            assert!(!value.contains('='), "pkce values should be unpadded");
            assert!(!value.contains('+'), "pkce values should be url safe");
            assert!(!value.contains('/'), "pkce values should be url safe");
        }
    }

    #[test]
    fn challenge_is_deterministic_in_the_verifier() {
        let pkce = PkceParams::new(&[CodeChallengeMethod::S256]).unwrap();
        let rederived = PkceParams::from_verifier(pkce.code_verifier.clone());
        assert_eq!(rederived.code_challenge, pkce.code_challenge);
    }

    #[test]
    fn verifier_is_fresh_per_call() {
        let a = PkceParams::new(&[CodeChallengeMethod::S256]).unwrap();
        let b = PkceParams::new(&[CodeChallengeMethod::S256]).unwrap();
        assert_ne!(a.code_verifier, b.code_verifier);
        assert_ne!(a.code_challenge, b.code_challenge);
    }

    #[test]
    fn negotiation_fails_without_a_usable_method() {
        let result = PkceParams::new(&[]);
        assert!(matches!(result, Err(PkceError::NoUsableMethod)));
    }
}
