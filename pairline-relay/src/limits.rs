//! Rate limiting for pairline-relay.
//!
//! Provides protection against connection flooding and line spam.
//!
//! Clients are anonymous, so there is nothing stronger than the transport
//! to key on: connection attempts are limited per peer IP address, and
//! inbound lines per assigned client id. Both use the governor crate's
//! keyed rate limiters backed by DashMap.

use crate::config::LimitsConfig;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use pairline_types::ClientId;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Type alias for a keyed rate limiter using DashMap.
type KeyedLimiter<K> = RateLimiter<
    K,
    dashmap::DashMap<K, InMemoryState>,
    DefaultClock,
    NoOpMiddleware<governor::clock::QuantaInstant>,
>;

/// How often idle limiter entries are evicted.
const SHRINK_INTERVAL: Duration = Duration::from_secs(300);

/// Rate limiters for the relay server.
#[derive(Clone)]
pub struct RateLimits {
    /// Limits connection attempts per peer IP address.
    ///
    /// Configured via `limits.connections_per_minute`.
    connection_limiter: Arc<KeyedLimiter<IpAddr>>,

    /// Limits inbound lines per client id.
    ///
    /// Configured via `limits.messages_per_minute`.
    line_limiter: Arc<KeyedLimiter<ClientId>>,
}

impl std::fmt::Debug for RateLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimits")
            .field("connection_limiter", &"KeyedLimiter<IpAddr>")
            .field("line_limiter", &"KeyedLimiter<ClientId>")
            .finish()
    }
}

impl RateLimits {
    /// Create rate limiters from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configured values are zero.
    pub fn new(config: &LimitsConfig) -> Self {
        let connections_per_minute = NonZeroU32::new(config.connections_per_minute)
            .expect("connections_per_minute must be > 0");
        let connection_quota = Quota::per_minute(connections_per_minute);

        let messages_per_minute =
            NonZeroU32::new(config.messages_per_minute).expect("messages_per_minute must be > 0");
        let line_quota = Quota::per_minute(messages_per_minute);

        Self {
            connection_limiter: Arc::new(RateLimiter::keyed(connection_quota)),
            line_limiter: Arc::new(RateLimiter::keyed(line_quota)),
        }
    }

    /// Check if a connection attempt from this address is allowed.
    pub fn check_connection(&self, addr: IpAddr) -> Result<(), RateLimitError> {
        self.connection_limiter
            .check_key(&addr)
            .map_err(|_| RateLimitError::ConnectionLimitExceeded)
    }

    /// Check if an inbound line from this client is allowed.
    pub fn check_line(&self, id: &ClientId) -> Result<(), RateLimitError> {
        self.line_limiter
            .check_key(id)
            .map_err(|_| RateLimitError::LineLimitExceeded)
    }

    /// Get the number of tracked connection keys (for metrics).
    pub fn connection_keys_count(&self) -> usize {
        self.connection_limiter.len()
    }

    /// Get the number of tracked line keys (for metrics).
    pub fn line_keys_count(&self) -> usize {
        self.line_limiter.len()
    }

    /// Evict stale entries from the keyed rate limiter DashMaps.
    ///
    /// Disconnected clients leave entries behind; `retain_recent()`
    /// removes entries whose rate limit cells have fully recharged.
    pub fn shrink(&self) {
        self.connection_limiter.retain_recent();
        self.line_limiter.retain_recent();
    }
}

/// Spawn a background task that periodically evicts idle limiter entries.
pub fn spawn_shrink_task(limits: RateLimits) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(SHRINK_INTERVAL);
        loop {
            timer.tick().await;
            limits.shrink();
            tracing::debug!(
                "limiter shrink: {} connection keys, {} line keys",
                limits.connection_keys_count(),
                limits.line_keys_count()
            );
        }
    })
}

/// Rate limit error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// Too many connection attempts from this address.
    ConnectionLimitExceeded,
    /// Too many inbound lines from this client.
    LineLimitExceeded,
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionLimitExceeded => {
                write!(f, "connection rate limit exceeded")
            }
            Self::LineLimitExceeded => {
                write!(f, "line rate limit exceeded")
            }
        }
    }
}

impl std::error::Error for RateLimitError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(connections: u32, messages: u32) -> LimitsConfig {
        LimitsConfig {
            connections_per_minute: connections,
            messages_per_minute: messages,
            max_concurrent_sessions: 10_000,
        }
    }

    fn addr(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    fn id(s: &str) -> ClientId {
        s.parse().unwrap()
    }

    #[test]
    fn create_rate_limits() {
        let limits = RateLimits::new(&test_config(5, 10));
        assert_eq!(limits.connection_keys_count(), 0);
        assert_eq!(limits.line_keys_count(), 0);
    }

    #[test]
    fn connection_limit_allows_within_quota() {
        let limits = RateLimits::new(&test_config(5, 100));

        for _ in 0..5 {
            assert!(limits.check_connection(addr(1)).is_ok());
        }

        assert_eq!(
            limits.check_connection(addr(1)),
            Err(RateLimitError::ConnectionLimitExceeded)
        );
    }

    #[test]
    fn line_limit_allows_within_quota() {
        let limits = RateLimits::new(&test_config(100, 5));
        let client = id("aaaaaa");

        for _ in 0..5 {
            assert!(limits.check_line(&client).is_ok());
        }

        assert_eq!(
            limits.check_line(&client),
            Err(RateLimitError::LineLimitExceeded)
        );
    }

    #[test]
    fn different_keys_have_independent_limits() {
        let limits = RateLimits::new(&test_config(2, 2));

        assert!(limits.check_line(&id("aaaaaa")).is_ok());
        assert!(limits.check_line(&id("aaaaaa")).is_ok());
        assert!(limits.check_line(&id("aaaaaa")).is_err());

        assert!(limits.check_line(&id("bbbbbb")).is_ok());
        assert!(limits.check_line(&id("bbbbbb")).is_ok());
        assert!(limits.check_line(&id("bbbbbb")).is_err());

        assert!(limits.check_connection(addr(1)).is_ok());
        assert!(limits.check_connection(addr(1)).is_ok());
        assert!(limits.check_connection(addr(1)).is_err());
        assert!(limits.check_connection(addr(2)).is_ok());
    }

    #[test]
    fn rate_limits_are_clone_and_debug() {
        let limits = RateLimits::new(&test_config(5, 10));
        let cloned = limits.clone();
        assert!(format!("{:?}", cloned).contains("RateLimits"));
    }

    #[test]
    fn rate_limit_error_display() {
        assert_eq!(
            RateLimitError::ConnectionLimitExceeded.to_string(),
            "connection rate limit exceeded"
        );
        assert_eq!(
            RateLimitError::LineLimitExceeded.to_string(),
            "line rate limit exceeded"
        );
    }

    #[test]
    fn shrink_does_not_panic() {
        let limits = RateLimits::new(&test_config(5, 10));

        let _ = limits.check_connection(addr(1));
        let _ = limits.check_line(&id("aaaaaa"));
        assert!(limits.connection_keys_count() > 0);

        // Freshly used entries may or may not be evicted depending on
        // timing, so only assert the call itself is sound.
        limits.shrink();
    }
}
