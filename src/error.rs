use thiserror::Error;

use crate::client::ClientError;
use crate::oidc::EntropyError;
use crate::pkce::PkceError;

/// Terminal failure of one authentication attempt.
///
/// Each variant carries the stable context phrase naming the step that
/// failed, with the underlying cause rendered inline and reachable through
/// `source()`. Steps are strictly sequential and short-circuit, so a caller
/// receives exactly one of these per invocation.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("could not generate a state: {0}")]
    StateGeneration(#[source] EntropyError),

    #[error("could not generate a nonce: {0}")]
    NonceGeneration(#[source] EntropyError),

    #[error("could not generate PKCE parameters: {0}")]
    PkceGeneration(#[source] PkceError),

    #[error("could not read an authorization code: {0}")]
    ReadAuthCode(#[source] std::io::Error),

    #[error("could not read a username: {0}")]
    ReadUsername(#[source] std::io::Error),

    #[error("could not read a password: {0}")]
    ReadPassword(#[source] std::io::Error),

    #[error("could not exchange the authorization code: {0}")]
    ExchangeAuthCode(#[source] ClientError),

    #[error("resource owner password credentials flow error: {0}")]
    Ropc(#[source] ClientError),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::AuthError;
    use crate::oidc::EntropyError;

    #[test]
    fn renders_context_phrase_and_cause() {
        let err = AuthError::StateGeneration(EntropyError {
            message: "entropy pool unavailable".to_string(),
        });
        let message = err.to_string();
        assert!(message.contains("could not generate a state"));
        assert!(message.contains("entropy pool unavailable"));
    }

    #[test]
    fn exposes_the_source() {
        let err = AuthError::ReadAuthCode(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        ));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("could not read an authorization code"));
    }
}
