//! Prometheus metrics endpoint.

use crate::server::PairRelay;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
/// Includes both gauges (current state) and counters (monotonic since startup).
pub async fn metrics_handler(Extension(relay): Extension<Arc<PairRelay>>) -> impl IntoResponse {
    let m = relay.metrics();

    // Gauges - current state
    let clients = relay.registry().total_clients().await;
    let pairs = relay.registry().total_pairs().await;

    // Counters - monotonic since startup
    let conns_total = m.connections_total.load(Ordering::Relaxed);
    let relayed = m.relayed_total.load(Ordering::Relaxed);
    let pairs_total = m.pairs_total.load(Ordering::Relaxed);
    let rate_limits = m.rate_limit_hits.load(Ordering::Relaxed);
    let errors = m.errors_total.load(Ordering::Relaxed);

    let body = format!(
        r#"# HELP pairline_clients_active Number of connected clients
# TYPE pairline_clients_active gauge
pairline_clients_active {clients}

# HELP pairline_pairs_active Number of established pairings
# TYPE pairline_pairs_active gauge
pairline_pairs_active {pairs}

# HELP pairline_info Server information
# TYPE pairline_info gauge
pairline_info{{version="{version}"}} 1

# HELP pairline_connections_total Total connections accepted
# TYPE pairline_connections_total counter
pairline_connections_total {conns_total}

# HELP pairline_relayed_total Total lines relayed between paired clients
# TYPE pairline_relayed_total counter
pairline_relayed_total {relayed}

# HELP pairline_pairs_total Total pairings established since startup
# TYPE pairline_pairs_total counter
pairline_pairs_total {pairs_total}

# HELP pairline_rate_limit_hits_total Total rate limit rejections
# TYPE pairline_rate_limit_hits_total counter
pairline_rate_limit_hits_total {rate_limits}

# HELP pairline_errors_total Total accept and read errors
# TYPE pairline_errors_total counter
pairline_errors_total {errors}
"#,
        version = env!("CARGO_PKG_VERSION"),
    );

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

#[cfg(test)]
mod tests {
    #[test]
    fn prometheus_format_is_valid() {
        let sample = format!(
            "# TYPE pairline_clients_active gauge\npairline_clients_active {}",
            42
        );
        assert!(sample.contains("gauge"));
        assert!(sample.contains("42"));
    }
}
