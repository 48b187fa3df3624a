//! Image feed client
//!
//! Command-line front end for the authenticated session:
//! 1. `authorize-url` prints the page to sign in on
//! 2. `login` trades the code (or the callback URL) for a stored token
//! 3. `profile` loads the signed-in user and their avatar
//! 4. `status` / `logout` inspect or discard the stored login

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use api_client::RequestCoordinator;
use session::{Session, SessionState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unsplash_auth::{
    AuthorizationOutcome, OAuthExchange, TokenStore, build_authorization_url, generate_state,
    parse_redirect,
};
use unsplash_profile::ProfileBootstrap;

use crate::config::Config;

/// How long `profile` waits for the background avatar fetch
const AVATAR_WAIT: Duration = Duration::from_secs(10);

const USAGE: &str = "usage: image-feed [--config <path>] <command>

commands:
  authorize-url                       print the sign-in URL
  login <code|redirect-url> [--state <s>]
                                      exchange an authorization code
  profile                             show the signed-in user
  status                              show whether a login is stored
  logout                              forget the stored login";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    AuthorizeUrl,
    Login { input: String, state: Option<String> },
    Profile,
    Status,
    Logout,
}

#[derive(Debug, PartialEq, Eq)]
struct Cli {
    config: Option<String>,
    command: Command,
}

/// Parse `args` (without the program name).
fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config = None;
    let mut state = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(iter.next().context("--config needs a path")?.clone());
            }
            "--state" => {
                state = Some(iter.next().context("--state needs a value")?.clone());
            }
            "-h" | "--help" => bail!("{USAGE}"),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("authorize-url") => Command::AuthorizeUrl,
        Some("login") => Command::Login {
            input: positional
                .next()
                .context("login needs an authorization code or redirect URL")?,
            state,
        },
        Some("profile") => Command::Profile,
        Some("status") => Command::Status,
        Some("logout") => Command::Logout,
        Some(other) => bail!("unknown command: {other}\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    };
    if let Some(extra) = positional.next() {
        bail!("unexpected argument: {extra}");
    }

    Ok(Cli { config, command })
}

/// A login argument is either the bare code or the full callback URL.
fn login_outcome(input: &str, state: Option<&str>) -> Result<AuthorizationOutcome> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return parse_redirect(input, state).context("not a usable authorization callback");
    }
    if input.trim().is_empty() {
        bail!("authorization code is empty");
    }
    Ok(AuthorizationOutcome::Code(input.trim().to_owned()))
}

async fn build_session(config: &Config) -> Result<Session> {
    let store = Arc::new(
        TokenStore::load(config.storage.token_path.clone())
            .await
            .with_context(|| {
                format!(
                    "failed to open credential store {}",
                    config.storage.token_path.display()
                )
            })?,
    );
    let coordinator = Arc::new(RequestCoordinator::new(reqwest::Client::new()));
    let exchange = OAuthExchange::new(
        config.oauth_config()?,
        Arc::clone(&coordinator),
        Arc::clone(&store),
    );
    let bootstrap = ProfileBootstrap::new(config.api.base_url.clone(), coordinator);
    Ok(Session::new(store, exchange, bootstrap).await)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!(
        api_base = %config.api.base_url,
        token_path = %config.storage.token_path.display(),
        "configuration loaded"
    );

    match cli.command {
        Command::AuthorizeUrl => {
            let state = generate_state();
            let url = build_authorization_url(&config.oauth_config()?, Some(&state))?;
            println!("{url}");
            println!("state: {state}");
        }
        Command::Login { input, state } => {
            let outcome = login_outcome(&input, state.as_deref())?;
            let session = build_session(&config).await?;
            match session.complete_login(outcome).await? {
                Some(profile) => {
                    println!("signed in as {} ({})", profile.display_name, profile.login_handle);
                }
                None => println!("signed in; profile could not be loaded yet"),
            }
        }
        Command::Profile => {
            let session = build_session(&config).await?;
            let mut avatars = session.subscribe_avatar();
            let profile = session
                .bootstrap_profile()
                .await
                .context("failed to load profile")?;
            println!("{}", serde_json::to_string_pretty(&profile)?);

            match tokio::time::timeout(AVATAR_WAIT, avatars.recv()).await {
                Ok(Ok(event)) => println!("avatar: {}", event.url),
                Ok(Err(e)) => warn!(error = %e, "avatar channel closed"),
                Err(_) => println!("avatar: unavailable"),
            }
        }
        Command::Status => {
            let session = build_session(&config).await?;
            let status = match session.state() {
                SessionState::Authenticated => "signed in",
                SessionState::Authenticating | SessionState::Unauthenticated => "signed out",
            };
            println!("{status} (credentials: {})", config.storage.token_path.display());
        }
        Command::Logout => {
            let session = build_session(&config).await?;
            session.sign_out().await?;
            println!("signed out");
        }
    }

    Ok(())
}
