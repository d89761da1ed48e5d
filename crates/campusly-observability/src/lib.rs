//! Campusly Observability
//!
//! - Tracing with console, rolling file and OpenTelemetry (OTLP) layers
//! - HTTP request logging middleware
//! - Prometheus metrics: HTTP counters and latency plus business counters
//!
//! Everything beyond console logging sits behind the `observability` feature
//! (on by default). At runtime `OBSERVABILITY_ENABLED=false` switches to
//! console logging and turns metrics recording into no-ops.
//!
//! ```no_run
//! use campusly_observability::{init_tracing, shutdown_tracer};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     // ... application code ...
//!     shutdown_tracer().await;
//! }
//! ```

pub mod basic_logging;
#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

use std::sync::OnceLock;

pub use basic_logging::init_basic_console_logging;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, logging_middleware, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    MetricsHandle, init_metrics, metrics_middleware, metrics_router, track_admission_decision,
    track_invite_created, track_invite_redeemed, track_login_failure, track_login_success,
    track_otp_issued, track_otp_verification, track_payment_recorded, track_user_created,
};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Reads `OBSERVABILITY_ENABLED` once; anything but `false`/`0` enables it.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
            .unwrap_or(true)
    })
}

// No-op stubs when observability is disabled at compile time
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{Router, extract::Request, middleware::Next, response::Response};

    pub type MetricsHandle = ();

    pub fn init_tracing() {
        super::init_basic_console_logging();
    }

    pub async fn shutdown_tracer() {}

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn init_metrics() -> Option<MetricsHandle> {
        None
    }

    pub fn metrics_router<S>(_handle: MetricsHandle) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
    }

    pub fn track_user_created(_role: &str) {}
    pub fn track_login_success(_role: &str) {}
    pub fn track_login_failure(_reason: &str) {}
    pub fn track_otp_issued(_purpose: &str) {}
    pub fn track_otp_verification(_purpose: &str, _outcome: &str) {}
    pub fn track_invite_created(_role: &str) {}
    pub fn track_invite_redeemed(_role: &str) {}
    pub fn track_payment_recorded(_method: &str, _amount_cents: i64) {}
    pub fn track_admission_decision(_status: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
