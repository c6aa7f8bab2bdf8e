//! Werewolf Arena Spectator - terminal entry point
//!
//! Usage: `arena-spectator [SESSION_ID]`
//!
//! Commands on stdin: `stop`, `inspect <message-id>`, `quit`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_spectator::infrastructure::http_client::HttpGameApi;
use arena_spectator::infrastructure::terminal::TerminalDisplay;
use arena_spectator::infrastructure::websocket::backoff::DEFAULT_HANDSHAKE_TIMEOUT_MS;
use arena_spectator::infrastructure::websocket::{PushClient, TungsteniteConnector};
use arena_spectator::ports::outbound::DisplaySurfaces;
use arena_spectator::{SpectatorConfig, SpectatorView};

fn load_dotenv() {
    for file in [".env.local", ".env"] {
        if Path::new(file).exists() && dotenvy::from_path(file).is_ok() {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // stdout is the display; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_spectator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SpectatorConfig::from_env(std::env::args().nth(1))
        .context("invalid spectator configuration")?;
    tracing::info!(
        session = %config.session,
        base_url = %config.base_url,
        ws_url = %config.ws_url,
        "Starting Werewolf Arena spectator"
    );

    let api = Arc::new(HttpGameApi::new(
        config.base_url.clone(),
        config.http_timeout,
    ));
    let connector = Arc::new(TungsteniteConnector::new(Duration::from_millis(
        DEFAULT_HANDSHAKE_TIMEOUT_MS,
    )));
    let transport = Arc::new(PushClient::new(
        config.ws_url.clone(),
        connector,
        config.reconnect,
    ));
    let display = Arc::new(TerminalDisplay::stdout());

    let view = SpectatorView::new(
        api,
        config.session.clone(),
        transport,
        DisplaySurfaces::all(display),
        config.view_settings(),
    );
    view.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(&view, line.trim()).await {
                            break;
                        }
                    }
                    // stdin closed: keep spectating until Ctrl+C.
                    Ok(None) => {
                        tokio::signal::ctrl_c().await.ok();
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read command");
                    }
                }
            }
        }
    }

    view.teardown().await;
    Ok(())
}

/// Returns `false` when the user asked to quit.
async fn handle_command(view: &SpectatorView, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("quit" | "exit") => return false,
        Some("stop") => {
            view.stop_game().await;
        }
        Some("inspect") => match parts.next() {
            Some(id) if view.inspect(id) => {}
            Some(id) => println!("no message with id '{id}'"),
            None => println!("usage: inspect <message-id>"),
        },
        Some(other) => println!("unknown command '{other}' (stop, inspect <id>, quit)"),
    }
    true
}
