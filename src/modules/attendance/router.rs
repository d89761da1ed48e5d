use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    close_session, create_session, get_session, get_sessions, get_student_summary,
    record_attendance, reopen_session,
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(get_sessions).post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/records", post(record_attendance))
        .route("/sessions/{id}/close", post(close_session))
        .route("/sessions/{id}/reopen", post(reopen_session))
        .route("/students/{student_id}/summary", get(get_student_summary))
}
