//! Stonescroll session host.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod host;
mod protocol;
mod session;

use config::HostConfig;
use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the protocol
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = HostConfig::from_env()?;

    info!("Starting Stonescroll host...");

    let session = match &config.resume {
        Some(json) => Session::resume(json)?,
        None => Session::new(config.players, config.rules, config.seed)?,
    };

    host::run_host(session, config.tick_ms).await
}
