//! HTTP endpoints for pairline-relay.
//!
//! Provides health checks and metrics alongside the relay endpoint.

pub mod health;
mod metrics;

use crate::server::PairRelay;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
///
/// The metrics endpoint is only mounted when enabled in the config.
pub fn build_router(relay: Arc<PairRelay>) -> Router {
    let mut router = Router::new().route("/health", get(health::health_handler));

    if relay.config().http.metrics_enabled {
        router = router.route("/metrics", get(metrics::metrics_handler));
    }

    router.layer(Extension(relay))
}
