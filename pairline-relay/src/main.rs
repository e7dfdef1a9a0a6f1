//! pairline-relay binary entry point.
//!
//! Usage:
//! ```bash
//! pairline-relay --config relay.toml
//! ```
//!
//! A missing config file is not an error; the server starts with defaults.

use anyhow::Context;
use pairline_relay::config::Config;
use pairline_relay::server::PairRelay;
use pairline_relay::{http, limits};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = get_config_path();
    let config = if config_path.exists() {
        Config::from_file(&config_path)
            .with_context(|| format!("failed to load config from {:?}", config_path))?
    } else {
        tracing::info!("config file {:?} not found, using defaults", config_path);
        Config::default()
    };

    http::health::init_start_time();

    let relay = Arc::new(PairRelay::new(config));

    // HTTP endpoints (health + metrics).
    let http_addr = relay.config().http.bind_address.clone();
    let router = http::build_router(Arc::clone(&relay));
    tokio::spawn(async move {
        match TcpListener::bind(&http_addr).await {
            Ok(listener) => {
                tracing::info!("http endpoints on {}", http_addr);
                if let Err(e) = axum::serve(listener, router).await {
                    tracing::error!("http server error: {}", e);
                }
            }
            Err(e) => tracing::error!("failed to bind http endpoint {}: {}", http_addr, e),
        }
    });

    limits::spawn_shrink_task(relay.rate_limits().clone());

    let listener = relay.bind_endpoint().await.with_context(|| {
        format!(
            "failed to bind relay endpoint {}",
            relay.config().server.bind_address
        )
    })?;
    tracing::info!("pairline relay listening on {}", listener.local_addr()?);

    relay.run(listener).await;
    Ok(())
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("relay.toml"))
}
