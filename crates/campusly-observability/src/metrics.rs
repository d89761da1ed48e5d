use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::is_observability_enabled;

pub type MetricsHandle = PrometheusHandle;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Installs the Prometheus recorder and spawns its upkeep task.
///
/// Returns `None` when observability is disabled or a recorder is already
/// installed (e.g. a second app in the same test process).
pub fn init_metrics() -> Option<MetricsHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|builder| builder.install_recorder())
        .map_err(|e| tracing::warn!(error = %e, "Prometheus recorder not installed"))
        .ok()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Records request count, latency and in-flight requests per matched route.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(latency);

    let status_category = match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("http_requests_by_status", "status_category" => status_category).increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// `GET /metrics` in the Prometheus text format.
pub fn metrics_router<S>(handle: MetricsHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics

pub fn track_user_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role" => role.to_string()).increment(1);
}

pub fn track_login_success(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => role.to_string(), "status" => "success").increment(1);
}

pub fn track_login_failure(reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "user_logins_total",
        "role" => "unknown",
        "status" => "failure",
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn track_otp_issued(purpose: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("otp_codes_issued_total", "purpose" => purpose.to_string()).increment(1);
}

pub fn track_otp_verification(purpose: &str, outcome: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "otp_verifications_total",
        "purpose" => purpose.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn track_invite_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("invites_created_total", "role" => role.to_string()).increment(1);
}

pub fn track_invite_redeemed(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("invites_redeemed_total", "role" => role.to_string()).increment(1);
}

pub fn track_payment_recorded(method: &str, amount_cents: i64) {
    if !is_observability_enabled() {
        return;
    }
    counter!("fee_payments_total", "method" => method.to_string()).increment(1);
    counter!("fee_payments_cents_total", "method" => method.to_string())
        .increment(amount_cents.max(0) as u64);
}

pub fn track_admission_decision(status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("admission_decisions_total", "status" => status.to_string()).increment(1);
}
