use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{AUTH_CODE_PROMPT, OOB_REDIRECT_URI, Output};
use crate::client::{AuthCodeUrlInput, ExchangeAuthCodeInput, OidcClient};
use crate::error::AuthError;
use crate::oidc;
use crate::pkce::PkceParams;
use crate::printer::Printer;
use crate::reader::Reader;

/// Options for the keyboard-interactive authorization code flow.
#[derive(Debug, Clone, Default)]
pub struct AuthCodeKeyboardOptions {
    /// Extra parameters merged verbatim into the authorization request.
    /// These override the protocol defaults on key collision.
    pub auth_request_extra_params: HashMap<String, String>,
}

/// Authorization code flow for environments without a reachable redirect
/// endpoint: the provider displays the code and the user copies it back by
/// hand.
///
/// The state value is generated for protocol completeness only. With no
/// redirect callback there is nothing to compare it against, so it is
/// embedded in the URL and never validated.
pub struct AuthCodeKeyboard<'a> {
    pub reader: &'a dyn Reader,
    pub printer: &'a dyn Printer,
}

impl AuthCodeKeyboard<'_> {
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        options: AuthCodeKeyboardOptions,
        client: &dyn OidcClient,
    ) -> Result<Output, AuthError> {
        debug!("performing the authorization code flow with keyboard interactive");
        let state = oidc::new_state().map_err(AuthError::StateGeneration)?;
        let nonce = oidc::new_nonce().map_err(AuthError::NonceGeneration)?;
        let pkce_params = PkceParams::new(&client.supported_pkce_methods())
            .map_err(AuthError::PkceGeneration)?;
        let auth_code_url = client.get_auth_code_url(&AuthCodeUrlInput {
            state,
            nonce: nonce.clone(),
            pkce_params: pkce_params.clone(),
            redirect_uri: OOB_REDIRECT_URI.to_string(),
            auth_request_extra_params: options.auth_request_extra_params,
        });
        self.printer.print(&format!("Open {auth_code_url}"));
        // Blocks until the user pastes the code; not wired to the
        // cancellation token, so a typed value is never discarded.
        let code = self
            .reader
            .read_string(AUTH_CODE_PROMPT)
            .map_err(AuthError::ReadAuthCode)?;

        let token_set = client
            .exchange_auth_code(
                cancel,
                ExchangeAuthCodeInput {
                    code,
                    pkce_params,
                    nonce,
                    redirect_uri: OOB_REDIRECT_URI.to_string(),
                },
            )
            .await
            .map_err(AuthError::ExchangeAuthCode)?;
        Ok(Output {
            id_token: token_set.id_token,
            id_token_claims: token_set.id_token_claims,
            refresh_token: token_set.refresh_token,
        })
    }
}
