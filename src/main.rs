use std::collections::HashMap;

use clap::{Parser, ValueEnum};
use oidc_connect::{
    AuthCodeKeyboard, AuthCodeKeyboardOptions, Client, ClientConfig, Ropc, RopcOptions,
    StderrPrinter, StdinReader,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "oidc-connect",
    about = "Log in to an OpenID Connect provider and print the tokens as JSON."
)]
struct Cli {
    /// Issuer URL, used to discover the provider metadata.
    #[arg(long)]
    issuer_url: String,

    /// OAuth 2.0 client ID.
    #[arg(long)]
    client_id: String,

    /// OAuth 2.0 client secret, for confidential clients.
    #[arg(long)]
    client_secret: Option<String>,

    /// Scope to request in addition to "openid". Repeatable.
    #[arg(long = "extra-scope")]
    extra_scopes: Vec<String>,

    /// Grant flow to run.
    #[arg(long, value_enum, default_value = "authcode-keyboard")]
    grant_type: GrantType,

    /// Username for the password grant; prompted for when omitted.
    #[arg(long, default_value = "")]
    username: String,

    /// Password for the password grant; prompted for when omitted.
    #[arg(long, default_value = "")]
    password: String,

    /// Extra key=value parameter appended to the authorization request.
    /// Repeatable; overrides defaults on key collision.
    #[arg(long = "auth-request-extra-param", value_parser = parse_key_value)]
    auth_request_extra_params: Vec<(String, String)>,

    /// Show debug output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GrantType {
    /// Authorization code flow with a manually copy-pasted code.
    AuthcodeKeyboard,
    /// Resource owner password credentials flow.
    Password,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "oidc_connect=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::new(cli.client_id.clone());
    if let Some(secret) = &cli.client_secret {
        config = config.with_client_secret(secret.clone());
    }
    for scope in &cli.extra_scopes {
        config = config.with_scope(scope.clone());
    }
    let client = Client::discover(&cli.issuer_url, config).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let reader = StdinReader;
    let printer = StderrPrinter;
    let output = match cli.grant_type {
        GrantType::AuthcodeKeyboard => {
            let flow = AuthCodeKeyboard {
                reader: &reader,
                printer: &printer,
            };
            let options = AuthCodeKeyboardOptions {
                auth_request_extra_params: cli
                    .auth_request_extra_params
                    .into_iter()
                    .collect::<HashMap<_, _>>(),
            };
            flow.run(&cancel, options, &client).await?
        }
        GrantType::Password => {
            let flow = Ropc { reader: &reader };
            let options = RopcOptions {
                username: cli.username,
                password: cli.password,
            };
            flow.run(&cancel, options, &client).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
