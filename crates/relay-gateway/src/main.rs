use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relay_channels::Dispatcher;
use relay_core::config::DEFAULT_CONFIG_PATH;
use relay_core::RelayConfig;
use relay_events::Formatter;
use relay_gateway::{build_router, AppState};
use relay_telegram::TelegramChannel;
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str =
    "relay_gateway=info,relay_events=info,relay_channels=info,relay_telegram=info,tower_http=debug";

#[derive(Debug, Parser)]
#[command(name = "harbor-relay", version, about = "Relay Harbor webhooks to Telegram")]
struct Cli {
    /// Config file. Falls back to $RELAY_CONFIG, then ./conf.toml.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let cli = Cli::parse();

    // config path: --config > RELAY_CONFIG env > ./conf.toml
    let config_path = cli
        .config
        .or_else(|| std::env::var_os("RELAY_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = RelayConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!(path = %config_path.display(), "config loaded");

    let enabled = config.enabled_events();
    if enabled.is_empty() {
        warn!("no event types enabled, every webhook will be ignored");
    } else {
        info!(events = ?enabled, "event types enabled");
    }

    let formatter = Formatter::from_config(&config).context("building formatter")?;
    let telegram =
        TelegramChannel::from_config(&config.telegram).context("building telegram channel")?;
    let dispatcher = Dispatcher::new(Arc::new(telegram));
    info!(
        chat_id = %config.telegram.chat_id,
        thread = ?config.telegram.message_thread_id,
        parse_mode = config.telegram.parse_mode.as_str(),
        "telegram channel ready"
    );

    let state = Arc::new(AppState::new(
        formatter,
        dispatcher,
        config.webhook.auth_header.clone(),
    ));
    if state.auth_header.is_some() {
        info!("webhook authentication enabled");
    }
    let router = build_router(state);

    let addr = bind_addr(&config.gateway.bind, config.gateway.port)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Harbor relay listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Harbor relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// `bind` is a bare IPv4 or IPv6 address (`0.0.0.0`, `::`, `[::1]`).
fn bind_addr(bind: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let host = bind.trim_start_matches('[').trim_end_matches(']');
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("invalid gateway bind address {bind:?}"))?;
    Ok(SocketAddr::new(ip, port))
}
