//! Service middleware for request metrics.
//!
//! ## Metrics Exposed
//!
//! Metrics are structured `tracing` events under the `excuse_engine::metrics`
//! target, aggregated downstream from the logs:
//!
//! - `request_metric` - one per request with normalized path, method, status, latency
//! - `excuse_metric` - one per generated excuse with type, role and latency

use std::sync::OnceLock;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use tracing::info;

use crate::role::Role;
use crate::types::ExcuseType;

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "excuse_engine::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces UUIDs with `:id`.
pub fn normalize_path(path: &str) -> String {
    static UUID: OnceLock<Regex> = OnceLock::new();
    let uuid = UUID.get_or_init(|| {
        Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
            .expect("static UUID pattern")
    });
    uuid.replace_all(path, ":id").to_string()
}

/// Record excuse generation metrics.
pub fn record_excuse_metric(mode: &str, excuse_type: ExcuseType, role: Option<Role>, latency_ms: u64) {
    info!(
        target: "excuse_engine::metrics",
        metric_type = "excuse",
        mode = mode,
        excuse_type = %excuse_type,
        role = role.map(|r| r.as_str()).unwrap_or("-"),
        latency_ms = latency_ms,
        "excuse_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_uuid() {
        let path = "/api/excuses/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/excuses/:id");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/api/excuses/role/dev"), "/api/excuses/role/dev");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }
}
