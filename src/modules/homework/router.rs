use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_homework, delete_homework, get_homework, get_homework_list, get_submissions,
    grade_submission, submit_homework, update_homework,
};

pub fn init_homework_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_homework_list).post(create_homework))
        .route(
            "/{id}",
            get(get_homework).put(update_homework).delete(delete_homework),
        )
        .route("/{id}/submissions", get(get_submissions).post(submit_homework))
        .route("/submissions/{id}/grade", post(grade_submission))
}
