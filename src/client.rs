use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::oidc::{IdTokenClaims, TokenSet};
use crate::pkce::{CodeChallengeMethod, PkceParams};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String, body: String },

    #[error("invalid id token: {message}")]
    InvalidIdToken { message: String },

    #[error("issuer mismatch (expected={expected}, received={received})")]
    IssuerMismatch { expected: String, received: String },

    #[error("nonce mismatch (expected={expected}, received={received})")]
    NonceMismatch { expected: String, received: String },

    #[error("operation cancelled")]
    Cancelled,
}

/// Request to build the authorization URL. Constructed by a flow, consumed
/// immediately.
#[derive(Debug, Clone)]
pub struct AuthCodeUrlInput {
    pub state: String,
    pub nonce: String,
    pub pkce_params: PkceParams,
    pub redirect_uri: String,
    /// Extra request parameters merged verbatim into the URL; these override
    /// the protocol defaults on key collision.
    pub auth_request_extra_params: HashMap<String, String>,
}

/// Request to redeem a manually transferred authorization code.
#[derive(Debug, Clone)]
pub struct ExchangeAuthCodeInput {
    pub code: String,
    pub pkce_params: PkceParams,
    pub nonce: String,
    pub redirect_uri: String,
}

/// Capability contract for the identity provider.
///
/// Implemented by [`Client`] for real providers and by test doubles so the
/// flows can be exercised without network I/O.
#[async_trait]
pub trait OidcClient: Send + Sync {
    /// Code challenge methods the provider advertises.
    fn supported_pkce_methods(&self) -> Vec<CodeChallengeMethod>;

    /// Builds the authorization URL. Pure construction, no I/O.
    fn get_auth_code_url(&self, input: &AuthCodeUrlInput) -> String;

    /// Exchanges an authorization code for tokens, verifying the returned
    /// nonce claim against the one sent.
    async fn exchange_auth_code(
        &self,
        cancel: &CancellationToken,
        input: ExchangeAuthCodeInput,
    ) -> Result<TokenSet, ClientError>;

    /// Performs the resource owner password credentials grant.
    async fn get_token_by_ropc(
        &self,
        cancel: &CancellationToken,
        username: &str,
        password: &str,
    ) -> Result<TokenSet, ClientError>;
}

/// Subset of the provider metadata document this client consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub code_challenge_methods_supported: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scopes: Vec<String>,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            scopes: vec!["openid".to_string()],
            timeout: None,
        }
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Token endpoint wire response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
}

/// Production OIDC client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    authorization_endpoint: Url,
    token_endpoint: Url,
    pkce_methods: Vec<CodeChallengeMethod>,
    http: reqwest::Client,
}

impl Client {
    /// Builds a client from known provider metadata. Endpoint URLs are
    /// parsed here so URL construction later is infallible.
    pub fn new(config: ClientConfig, metadata: &ProviderMetadata) -> Result<Self, ClientError> {
        let http = build_http(&config)?;
        Self::with_http(config, metadata, http)
    }

    pub fn with_http(
        config: ClientConfig,
        metadata: &ProviderMetadata,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        let pkce_methods = metadata
            .code_challenge_methods_supported
            .iter()
            .filter_map(|method| CodeChallengeMethod::parse(method))
            .collect();
        Ok(Self {
            authorization_endpoint: Url::parse(&metadata.authorization_endpoint)?,
            token_endpoint: Url::parse(&metadata.token_endpoint)?,
            pkce_methods,
            config,
            http,
        })
    }

    /// Fetches `{issuer}/.well-known/openid-configuration` and builds a
    /// client from the advertised endpoints.
    pub async fn discover(issuer_url: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let http = build_http(&config)?;
        let discovery_url = format!(
            "{}/.well-known/openid-configuration",
            issuer_url.trim_end_matches('/')
        );
        debug!(%discovery_url, "fetching provider metadata");
        let response = http.get(&discovery_url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let metadata: ProviderMetadata =
            serde_json::from_str(&body).map_err(|err| ClientError::InvalidResponse {
                message: err.to_string(),
                body,
            })?;
        if metadata.issuer.trim_end_matches('/') != issuer_url.trim_end_matches('/') {
            return Err(ClientError::IssuerMismatch {
                expected: issuer_url.to_string(),
                received: metadata.issuer,
            });
        }
        Self::with_http(config, &metadata, http)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send_token_request(
        &self,
        cancel: &CancellationToken,
        payload: HashMap<String, String>,
    ) -> Result<TokenResponse, ClientError> {
        let request = async {
            let response = self
                .http
                .post(self.token_endpoint.clone())
                .form(&payload)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(ClientError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }
            serde_json::from_str(&body).map_err(|err| ClientError::InvalidResponse {
                message: err.to_string(),
                body,
            })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = request => result,
        }
    }
}

#[async_trait]
impl OidcClient for Client {
    fn supported_pkce_methods(&self) -> Vec<CodeChallengeMethod> {
        self.pkce_methods.clone()
    }

    fn get_auth_code_url(&self, input: &AuthCodeUrlInput) -> String {
        let mut params: HashMap<String, String> = HashMap::new();
        params.insert("response_type".to_string(), "code".to_string());
        params.insert("client_id".to_string(), self.config.client_id.clone());
        params.insert("redirect_uri".to_string(), input.redirect_uri.clone());
        params.insert("scope".to_string(), self.config.scopes.join(" "));
        params.insert("state".to_string(), input.state.clone());
        params.insert("nonce".to_string(), input.nonce.clone());
        params.insert(
            "code_challenge".to_string(),
            input.pkce_params.code_challenge.clone(),
        );
        params.insert(
            "code_challenge_method".to_string(),
            input.pkce_params.method.as_str().to_string(),
        );
        // Caller extras win on key collision.
        for (key, value) in &input.auth_request_extra_params {
            params.insert(key.clone(), value.clone());
        }

        let mut url = self.authorization_endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(&key, &value);
            }
        }
        url.to_string()
    }

    async fn exchange_auth_code(
        &self,
        cancel: &CancellationToken,
        input: ExchangeAuthCodeInput,
    ) -> Result<TokenSet, ClientError> {
        let mut payload = HashMap::new();
        payload.insert("grant_type".to_string(), "authorization_code".to_string());
        payload.insert("code".to_string(), input.code);
        payload.insert("redirect_uri".to_string(), input.redirect_uri);
        payload.insert("client_id".to_string(), self.config.client_id.clone());
        payload.insert(
            "code_verifier".to_string(),
            input.pkce_params.code_verifier,
        );
        if let Some(secret) = &self.config.client_secret {
            payload.insert("client_secret".to_string(), secret.clone());
        }

        let response = self.send_token_request(cancel, payload).await?;
        token_set_from_response(response, Some(&input.nonce))
    }

    async fn get_token_by_ropc(
        &self,
        cancel: &CancellationToken,
        username: &str,
        password: &str,
    ) -> Result<TokenSet, ClientError> {
        let mut payload = HashMap::new();
        payload.insert("grant_type".to_string(), "password".to_string());
        payload.insert("username".to_string(), username.to_string());
        payload.insert("password".to_string(), password.to_string());
        payload.insert("client_id".to_string(), self.config.client_id.clone());
        payload.insert("scope".to_string(), self.config.scopes.join(" "));
        if let Some(secret) = &self.config.client_secret {
            payload.insert("client_secret".to_string(), secret.clone());
        }

        let response = self.send_token_request(cancel, payload).await?;
        // No nonce was sent with this grant, so there is nothing to verify.
        token_set_from_response(response, None)
    }
}

fn build_http(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn token_set_from_response(
    response: TokenResponse,
    expected_nonce: Option<&str>,
) -> Result<TokenSet, ClientError> {
    let id_token = response.id_token.ok_or_else(|| ClientError::InvalidResponse {
        message: "missing id_token in token response".to_string(),
        body: String::new(),
    })?;
    let claims = decode_id_token_claims(&id_token)?;
    if let Some(expected) = expected_nonce {
        match claims.nonce.as_deref() {
            Some(received) if received == expected => {}
            Some(received) => {
                return Err(ClientError::NonceMismatch {
                    expected: expected.to_string(),
                    received: received.to_string(),
                });
            }
            None => {
                return Err(ClientError::InvalidIdToken {
                    message: "missing nonce claim".to_string(),
                });
            }
        }
    }
    Ok(TokenSet {
        id_token,
        id_token_claims: claims,
        refresh_token: response.refresh_token,
    })
}

/// Decodes the claims from the ID token payload.
///
/// The signature is the provider's to get right; this client trusts the
/// token because it arrived over TLS from the token endpoint it asked.
fn decode_id_token_claims(id_token: &str) -> Result<IdTokenClaims, ClientError> {
    let parts: Vec<&str> = id_token.split('.').collect();
    if parts.len() != 3 {
        return Err(ClientError::InvalidIdToken {
            message: "expected a three-part JWT".to_string(),
        });
    }
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .or_else(|_| URL_SAFE.decode(parts[1]))
        .map_err(|err| ClientError::InvalidIdToken {
            message: format!("payload is not base64url: {err}"),
        })?;
    serde_json::from_slice(&payload).map_err(|err| ClientError::InvalidIdToken {
        message: format!("claims are not valid JSON: {err}"),
    })
}
