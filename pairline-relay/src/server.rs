//! Shared server state and the TCP accept loop.
//!
//! `PairRelay` owns the registry, rate limiters and metrics, and wires
//! every accepted connection into a new [`Session`](crate::session::Session).

use crate::config::Config;
use crate::ident::IdentitySource;
use crate::limits::RateLimits;
use crate::registry::Registry;
use crate::session::Session;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
/// Thread-safe via `AtomicU64` - no locks needed for incrementing.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total connections accepted (before registration).
    pub connections_total: AtomicU64,
    /// Total text lines relayed between paired clients.
    pub relayed_total: AtomicU64,
    /// Total pairings established.
    pub pairs_total: AtomicU64,
    /// Total rate limit rejections (connection + line).
    pub rate_limit_hits: AtomicU64,
    /// Total accept and read errors.
    pub errors_total: AtomicU64,
}

/// Main relay server.
pub struct PairRelay {
    config: Config,
    registry: Registry,
    rate_limits: RateLimits,
    metrics: RelayMetrics,
}

impl std::fmt::Debug for PairRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairRelay")
            .field("config", &self.config)
            .field("rate_limits", &self.rate_limits)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl PairRelay {
    /// Create a new PairRelay with the given config.
    pub fn new(config: Config) -> Self {
        let rate_limits = RateLimits::new(&config.limits);
        Self {
            config,
            registry: Registry::new(),
            rate_limits,
            metrics: RelayMetrics::default(),
        }
    }

    /// Create a new PairRelay with a custom identity source.
    pub fn with_identity_source(config: Config, ids: Box<dyn IdentitySource>) -> Self {
        let rate_limits = RateLimits::new(&config.limits);
        Self {
            config,
            registry: Registry::with_identity_source(ids),
            rate_limits,
            metrics: RelayMetrics::default(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the client registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get access to the rate limiters.
    pub fn rate_limits(&self) -> &RateLimits {
        &self.rate_limits
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Bind the relay TCP endpoint named in the configuration.
    pub async fn bind_endpoint(&self) -> crate::error::Result<TcpListener> {
        let listener = TcpListener::bind(&self.config.server.bind_address).await?;
        Ok(listener)
    }

    /// Run the accept loop.
    ///
    /// Per-connection accept errors are logged and the loop continues;
    /// nothing short of the listener itself disappearing stops the server.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("error accepting connection: {}", e);
                    self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            if self.rate_limits.check_connection(peer_addr.ip()).is_err() {
                tracing::warn!("connection rate limited for {}", peer_addr);
                self.metrics.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let max_sessions = self.config.limits.max_concurrent_sessions;
            let active = self.registry.total_clients().await;
            if active >= max_sessions {
                tracing::warn!(
                    "session limit reached ({}/{}), rejecting {}",
                    active,
                    max_sessions,
                    peer_addr
                );
                continue;
            }

            self.metrics.connections_total.fetch_add(1, Ordering::Relaxed);

            let session = Session::new(Arc::clone(&self), stream, peer_addr);
            // Spawn the session handler - don't block the accept loop.
            tokio::spawn(session.run());
        }
    }
}
