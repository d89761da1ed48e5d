use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    accept_application, create_application, get_application, get_applications,
    record_assessment, reject_application, schedule_assessment,
};

pub fn init_admissions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_applications).post(create_application))
        .route("/{id}", get(get_application))
        .route("/{id}/schedule-assessment", post(schedule_assessment))
        .route("/{id}/assessment", post(record_assessment))
        .route("/{id}/accept", post(accept_application))
        .route("/{id}/reject", post(reject_application))
}
