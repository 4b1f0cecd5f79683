//! Interactive login flows.
//!
//! Each flow is a self-contained use case invoked once per authentication
//! attempt. Flows reach the identity provider, the terminal and the user
//! only through capability traits, so they can be exercised with the test
//! doubles in this module's test support instead of a real network or tty.

mod authcode_keyboard;
mod ropc;

pub use authcode_keyboard::{AuthCodeKeyboard, AuthCodeKeyboardOptions};
pub use ropc::{Ropc, RopcOptions};

use serde::Serialize;

use crate::oidc::IdTokenClaims;

/// Redirect URI telling the provider to display the authorization code to
/// the user instead of redirecting a browser.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Prompt for the manually transferred authorization code.
pub const AUTH_CODE_PROMPT: &str = "Enter code: ";

/// Prompt for a missing username in the password grant.
pub const USERNAME_PROMPT: &str = "Username: ";

/// Prompt for a missing password in the password grant.
pub const PASSWORD_PROMPT: &str = "Password: ";

/// Result of a successful login flow, copied verbatim from the client's
/// token set.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub id_token: String,
    pub id_token_claims: IdTokenClaims,
    pub refresh_token: Option<String>,
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use crate::client::{AuthCodeUrlInput, ClientError, ExchangeAuthCodeInput, OidcClient};
    use crate::oidc::{IdTokenClaims, StringOrVec, TokenSet};
    use crate::pkce::CodeChallengeMethod;
    use crate::printer::Printer;
    use crate::reader::Reader;

    pub(crate) fn claims() -> IdTokenClaims {
        IdTokenClaims {
            iss: "https://issuer.example.com".to_string(),
            sub: "user-1".to_string(),
            aud: StringOrVec::String("client-id".to_string()),
            exp: 4_102_444_800,
            iat: 1_700_000_000,
            nonce: None,
            email: None,
            name: None,
            extra: HashMap::new(),
        }
    }

    pub(crate) fn token_set(id_token: &str, refresh_token: Option<&str>) -> TokenSet {
        TokenSet {
            id_token: id_token.to_string(),
            id_token_claims: claims(),
            refresh_token: refresh_token.map(str::to_string),
        }
    }

    /// Client double recording every call it receives.
    pub(crate) struct StubClient {
        pub pkce_methods: Vec<CodeChallengeMethod>,
        pub exchange_result: Mutex<Option<Result<TokenSet, ClientError>>>,
        pub ropc_result: Mutex<Option<Result<TokenSet, ClientError>>>,
        pub auth_code_url_inputs: Mutex<Vec<AuthCodeUrlInput>>,
        pub exchange_inputs: Mutex<Vec<ExchangeAuthCodeInput>>,
        pub ropc_credentials: Mutex<Vec<(String, String)>>,
    }

    impl StubClient {
        pub(crate) fn new() -> Self {
            Self {
                pkce_methods: vec![CodeChallengeMethod::S256],
                exchange_result: Mutex::new(None),
                ropc_result: Mutex::new(None),
                auth_code_url_inputs: Mutex::new(Vec::new()),
                exchange_inputs: Mutex::new(Vec::new()),
                ropc_credentials: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn exchange_returning(result: Result<TokenSet, ClientError>) -> Self {
            let stub = Self::new();
            *stub.exchange_result.lock().unwrap() = Some(result);
            stub
        }

        pub(crate) fn ropc_returning(result: Result<TokenSet, ClientError>) -> Self {
            let stub = Self::new();
            *stub.ropc_result.lock().unwrap() = Some(result);
            stub
        }
    }

    #[async_trait]
    impl OidcClient for StubClient {
        fn supported_pkce_methods(&self) -> Vec<CodeChallengeMethod> {
            self.pkce_methods.clone()
        }

        fn get_auth_code_url(&self, input: &AuthCodeUrlInput) -> String {
            self.auth_code_url_inputs.lock().unwrap().push(input.clone());
            "https://issuer.example.com/authorize?stubbed".to_string()
        }

        async fn exchange_auth_code(
            &self,
            _cancel: &CancellationToken,
            input: ExchangeAuthCodeInput,
        ) -> Result<TokenSet, ClientError> {
            self.exchange_inputs.lock().unwrap().push(input);
            self.exchange_result
                .lock()
                .unwrap()
                .take()
                .expect("unexpected exchange_auth_code call")
        }

        async fn get_token_by_ropc(
            &self,
            _cancel: &CancellationToken,
            username: &str,
            password: &str,
        ) -> Result<TokenSet, ClientError> {
            self.ropc_credentials
                .lock()
                .unwrap()
                .push((username.to_string(), password.to_string()));
            self.ropc_result
                .lock()
                .unwrap()
                .take()
                .expect("unexpected get_token_by_ropc call")
        }
    }

    /// Reader double answering from queued responses.
    pub(crate) struct StubReader {
        pub strings: Mutex<Vec<io::Result<String>>>,
        pub passwords: Mutex<Vec<io::Result<String>>>,
        pub string_prompts: Mutex<Vec<String>>,
        pub password_prompts: Mutex<Vec<String>>,
    }

    impl StubReader {
        pub(crate) fn empty() -> Self {
            Self {
                strings: Mutex::new(Vec::new()),
                passwords: Mutex::new(Vec::new()),
                string_prompts: Mutex::new(Vec::new()),
                password_prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_string(response: io::Result<String>) -> Self {
            let reader = Self::empty();
            reader.strings.lock().unwrap().push(response);
            reader
        }

        pub(crate) fn with_password(response: io::Result<String>) -> Self {
            let reader = Self::empty();
            reader.passwords.lock().unwrap().push(response);
            reader
        }
    }

    impl Reader for StubReader {
        fn read_string(&self, prompt: &str) -> io::Result<String> {
            self.string_prompts.lock().unwrap().push(prompt.to_string());
            let mut strings = self.strings.lock().unwrap();
            if strings.is_empty() {
                panic!("unexpected read_string call");
            }
            strings.remove(0)
        }

        fn read_password(&self, prompt: &str) -> io::Result<String> {
            self.password_prompts.lock().unwrap().push(prompt.to_string());
            let mut passwords = self.passwords.lock().unwrap();
            if passwords.is_empty() {
                panic!("unexpected read_password call");
            }
            passwords.remove(0)
        }
    }

    /// Printer double capturing everything printed.
    #[derive(Default)]
    pub(crate) struct CapturePrinter {
        pub messages: Mutex<Vec<String>>,
    }

    impl Printer for CapturePrinter {
        fn print(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }
}
