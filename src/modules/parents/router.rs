use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    create_parent, delete_parent, get_my_children, get_parent, get_parents, link_child,
    unlink_child, update_parent,
};

pub fn init_parents_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_parents).post(create_parent))
        .route("/me/children", get(get_my_children))
        .route(
            "/{id}",
            get(get_parent).put(update_parent).delete(delete_parent),
        )
        .route("/{id}/children", post(link_child))
        .route("/{id}/children/{student_id}", delete(unlink_child))
}
