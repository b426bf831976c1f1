//! Command-line client for the facelog attendance backend.
//!
//! Run with: cargo run -p facelog-cli -- login --username ana
//!
//! Tokens are kept in a session file between invocations, so a `login`
//! followed by any number of `fetch` calls behaves like a browser tab.

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use facelog_core::{ApiRequest, ApiResponse, ClientConfig, Method};
use facelog_session::{SessionManager, storage::FileStore};
use facelog_transport::{ApiClient, ReqwestTransport};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Client = ApiClient<FileStore, ReqwestTransport>;

#[derive(Parser)]
#[command(name = "facelog", version, about = "Talk to the facelog attendance API")]
struct Cli {
    /// Session file (defaults to $FACELOG_SESSION_FILE or the platform data dir)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Backend origin, overriding $FACELOG_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the issued tokens
    Login {
        #[arg(long)]
        username: String,
        /// Password (falls back to $FACELOG_PASSWORD)
        #[arg(long, env = "FACELOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Register a new account from a JSON object and store the issued tokens
    Register {
        /// Registration fields as JSON
        data: String,
    },
    /// Send an authenticated request and print the response
    Fetch {
        /// Path relative to <origin>/api, or an absolute URL
        target: String,
        /// HTTP method, e.g. GET, POST, OPTIONS
        #[arg(long, short = 'X', default_value = "GET", value_parser = parse_method)]
        method: Method,
        /// JSON request body
        #[arg(long, short)]
        data: Option<String>,
    },
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Forget the stored tokens
    Logout,
    /// Show the session state
    Status,
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let client = build_client(&cli).await?;

    match cli.command {
        Command::Login { username, password } => {
            let auth = client.login(&username, &password).await?;
            println!("{}", serde_json::to_string_pretty(&auth.user)?);
        }
        Command::Register { data } => {
            let payload: Value = serde_json::from_str(&data).context("registration data is not JSON")?;
            if !payload.is_object() {
                bail!("registration data must be a JSON object");
            }
            let auth = client.register(&payload).await?;
            println!("{}", serde_json::to_string_pretty(&auth.user)?);
        }
        Command::Fetch {
            target,
            method,
            data,
        } => {
            let mut request = ApiRequest::new(method, target);
            if let Some(data) = data {
                let body: Value = serde_json::from_str(&data).context("request body is not JSON")?;
                request = request.json(&body)?;
            }
            let response = client.authenticated_fetch(request).await?;
            print_response(&response);
            if !response.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Refresh => {
            if client.refresh_access_token().await.is_none() {
                bail!("no session could be refreshed; log in again");
            }
            println!("access token refreshed");
        }
        Command::Logout => {
            client.logout().await?;
            println!("logged out");
        }
        Command::Status => {
            let session = client.session();
            println!("backend:  {}", client.config().api_url());
            println!("session:  {}", session.store().path().display());
            println!("state:    {:?}", session.state());
            println!("access:   {}", present(session.access_token().await.is_some()));
            println!("refresh:  {}", present(session.refresh_token().await.is_some()));
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn build_client(cli: &Cli) -> Result<Client> {
    let config = match &cli.api_url {
        Some(url) => ClientConfig::new(url)?,
        None => ClientConfig::from_env()?,
    };

    let store = match &cli.session_file {
        Some(path) => FileStore::new(path),
        None => FileStore::open_default()?,
    };
    tracing::debug!(path = %store.path().display(), "Using session file");

    let transport = ReqwestTransport::new(&config)?;
    let session = Arc::new(SessionManager::open(store).await);
    Ok(ApiClient::new(config, session, transport))
}

fn print_response(response: &ApiResponse) {
    eprintln!("HTTP {}", response.status);
    match response.json::<Value>() {
        Ok(json) => println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| response.text())
        ),
        Err(_) => println!("{}", response.text()),
    }
}

const fn present(held: bool) -> &'static str {
    if held { "present" } else { "absent" }
}
