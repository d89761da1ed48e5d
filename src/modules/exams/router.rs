use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_exam, delete_exam, enter_marks, get_exam, get_exams, get_marks, get_student_results,
    publish_exam, update_exam,
};

pub fn init_exams_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_exams).post(create_exam))
        .route("/results/students/{student_id}", get(get_student_results))
        .route("/{id}", get(get_exam).put(update_exam).delete(delete_exam))
        .route("/{id}/marks", get(get_marks).post(enter_marks))
        .route("/{id}/publish", post(publish_exam))
}
