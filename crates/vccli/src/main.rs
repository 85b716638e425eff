//! vccli - talk to the vCenter REST API without managing sessions by hand.
//!
//! Connection settings come from `VCCLI_*` environment variables (a `.env`
//! file is honored). The password is prompted for when not set.

use std::io;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vccli_core::{ClientConfig, ClientHandle};

const USAGE: &str = "\
Usage: vccli <command>

Commands:
  session        Show the user and creation time of the current session
  get <path>     Send an authenticated GET and print the response body
  post <path> [json]
                 Send an authenticated POST with a JSON body (default: {})

Environment:
  VCCLI_URL, VCCLI_USERNAME, VCCLI_PASSWORD
  VCCLI_TIMEOUT_SECS, VCCLI_AUTH_TIMEOUT_SECS (0 disables)
  RUST_LOG (default: warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Read the client configuration, prompting for the password if it is not set.
fn load_config() -> Result<ClientConfig> {
    let password = match std::env::var("VCCLI_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("vCenter password: ").context("Failed to read password")?,
    };

    let config = ClientConfig::from_lookup(|name| {
        if name == "VCCLI_PASSWORD" {
            Some(password.clone())
        } else {
            std::env::var(name).ok()
        }
    })
    .context("Invalid configuration")?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str);
    if matches!(command, None | Some("-h" | "--help" | "help")) {
        println!("{USAGE}");
        return Ok(());
    }

    init_tracing();

    let config = load_config()?;
    info!(url = %config.base_url, user = %config.username, "connecting");
    let client = ClientHandle::from_config(config).context("Failed to create client")?;

    match (command, args.get(1)) {
        (Some("session"), _) => show_session(&client).await,
        (Some("get"), Some(path)) => get(&client, path).await,
        (Some("post"), Some(path)) => post(&client, path, args.get(2).map(String::as_str)).await,
        _ => {
            eprintln!("{USAGE}");
            bail!("Unknown command: {}", args.join(" "));
        }
    }
}

async fn show_session(client: &ClientHandle) -> Result<()> {
    let info = client
        .session_info()
        .await
        .context("Failed to fetch session info")?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn get(client: &ClientHandle, path: &str) -> Result<()> {
    let response = client
        .get(path)
        .await
        .with_context(|| format!("GET {} failed", path))?;
    print_response(response).await
}

async fn post(client: &ClientHandle, path: &str, body: Option<&str>) -> Result<()> {
    let body: serde_json::Value =
        serde_json::from_str(body.unwrap_or("{}")).context("Request body is not valid JSON")?;
    let response = client
        .post_json(path, &body)
        .await
        .with_context(|| format!("POST {} failed", path))?;
    print_response(response).await
}

/// Print the body (pretty if JSON); fail on a non-success status.
async fn print_response(response: vccli_core::client::Response) -> Result<()> {
    let status = response.status();
    let text = response.text().await.context("Failed to read response body")?;

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        bail!("Request failed with status {}", status);
    }
    Ok(())
}
