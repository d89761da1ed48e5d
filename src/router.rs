use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{Router, middleware, routing::get};
use campusly_observability::{MetricsHandle, logging_middleware, metrics_middleware, metrics_router};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::modules::admissions::router::init_admissions_router;
use crate::modules::announcements::router::init_announcements_router;
use crate::modules::attendance::router::init_attendance_router;
use crate::modules::auth::router::{init_auth_router, init_session_router};
use crate::modules::classes::router::{init_classes_router, init_sections_router};
use crate::modules::dashboard::router::init_dashboard_router;
use crate::modules::exams::router::init_exams_router;
use crate::modules::fees::router::init_fees_router;
use crate::modules::health::controller::health_check;
use crate::modules::homework::router::init_homework_router;
use crate::modules::invites::router::init_invites_router;
use crate::modules::library::router::init_library_router;
use crate::modules::messages::router::init_messages_router;
use crate::modules::parents::router::init_parents_router;
use crate::modules::students::router::init_students_router;
use crate::modules::subjects::router::init_subjects_router;
use crate::modules::teachers::router::init_teachers_router;
use crate::modules::transport::router::init_transport_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

fn auth_routes(state: &AppState) -> Router<AppState> {
    let router = init_auth_router();
    if !state.rate_limit_config.enabled {
        return router;
    }
    match state.rate_limit_config.auth_governor_config() {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => {
            warn!("Invalid auth rate limit settings, auth limiter disabled");
            router
        }
    }
}

fn api_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .nest("/auth", auth_routes(state).merge(init_session_router()))
        .nest("/invites", init_invites_router(state.clone()))
        .nest("/users", init_users_router())
        .nest("/students", init_students_router())
        .nest("/teachers", init_teachers_router())
        .nest("/parents", init_parents_router())
        .nest("/classes", init_classes_router())
        .nest("/sections", init_sections_router())
        .nest("/subjects", init_subjects_router())
        .nest("/exams", init_exams_router())
        .nest("/attendance", init_attendance_router())
        .nest("/fees", init_fees_router())
        .nest("/homework", init_homework_router())
        .nest("/library", init_library_router())
        .nest("/transport", init_transport_router())
        .nest("/messages", init_messages_router())
        .nest("/announcements", init_announcements_router())
        .nest("/admissions", init_admissions_router())
        .nest("/dashboard", init_dashboard_router());

    if !state.rate_limit_config.enabled {
        return router;
    }
    match state.rate_limit_config.general_governor_config() {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => {
            warn!("Invalid general rate limit settings, API limiter disabled");
            router
        }
    }
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}

pub fn init_router(state: AppState, metrics: Option<MetricsHandle>) -> Router {
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest("/api", api_routes(&state));

    if let Some(handle) = metrics {
        router = router.merge(metrics_router(handle));
    }

    router
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
