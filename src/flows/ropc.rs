use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Output, PASSWORD_PROMPT, USERNAME_PROMPT};
use crate::client::OidcClient;
use crate::error::AuthError;
use crate::reader::Reader;

/// Options for the resource owner password credentials flow. Empty fields
/// are prompted for interactively.
#[derive(Debug, Clone, Default)]
pub struct RopcOptions {
    pub username: String,
    pub password: String,
}

/// Resource owner password credentials grant: exchanges a username and
/// password directly for tokens.
///
/// No state, nonce or PKCE parameters are involved; there is no redirect
/// and no authorization code to bind or replay-protect.
pub struct Ropc<'a> {
    pub reader: &'a dyn Reader,
}

impl Ropc<'_> {
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        options: RopcOptions,
        client: &dyn OidcClient,
    ) -> Result<Output, AuthError> {
        debug!("performing the resource owner password credentials flow");
        let username = if options.username.is_empty() {
            self.reader
                .read_string(USERNAME_PROMPT)
                .map_err(AuthError::ReadUsername)?
        } else {
            options.username
        };
        let password = if options.password.is_empty() {
            self.reader
                .read_password(PASSWORD_PROMPT)
                .map_err(AuthError::ReadPassword)?
        } else {
            options.password
        };
        let token_set = client
            .get_token_by_ropc(cancel, &username, &password)
            .await
            .map_err(AuthError::Ropc)?;
        debug!("resource owner password credentials flow completed");
        Ok(Output {
            id_token: token_set.id_token,
            id_token_claims: token_set.id_token_claims,
            refresh_token: token_set.refresh_token,
        })
    }
}
