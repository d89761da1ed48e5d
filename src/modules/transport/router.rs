use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{
    assign_student, create_route, delete_route, get_route, get_route_students, get_routes,
    unassign_student, update_route,
};

pub fn init_transport_router() -> Router<AppState> {
    Router::new()
        .route("/routes", get(get_routes).post(create_route))
        .route(
            "/routes/{id}",
            get(get_route).put(update_route).delete(delete_route),
        )
        .route(
            "/routes/{id}/students",
            get(get_route_students).post(assign_student),
        )
        .route("/routes/{id}/students/{student_id}", delete(unassign_student))
}
