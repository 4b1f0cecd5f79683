//! OpenID Connect login flows for command-line credential helpers.
//!
//! This crate obtains an ID token (and optionally a refresh token) from an
//! OpenID Connect provider without running a local callback server: either
//! the user copies an authorization code back by hand (keyboard-interactive
//! authorization code flow with PKCE), or a username and password are
//! exchanged directly (resource owner password credentials flow).

mod client;
mod error;
mod flows;
mod oidc;
mod pkce;
mod printer;
mod reader;

pub use client::{
    AuthCodeUrlInput, Client, ClientConfig, ClientError, ExchangeAuthCodeInput, OidcClient,
    ProviderMetadata, TokenResponse,
};
pub use error::AuthError;
pub use flows::{
    AUTH_CODE_PROMPT, AuthCodeKeyboard, AuthCodeKeyboardOptions, OOB_REDIRECT_URI, Output,
    PASSWORD_PROMPT, Ropc, RopcOptions, USERNAME_PROMPT,
};
pub use oidc::{EntropyError, IdTokenClaims, StringOrVec, TokenSet, new_nonce, new_state};
pub use pkce::{CodeChallengeMethod, PkceError, PkceParams};
pub use printer::{Printer, StderrPrinter};
pub use reader::{Reader, StdinReader};
