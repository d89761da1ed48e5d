use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{
    create_class, create_section, delete_class, delete_section, get_class, get_classes,
    get_sections, update_class, update_section,
};

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_classes).post(create_class))
        .route("/{id}", get(get_class).put(update_class).delete(delete_class))
        .route("/{id}/sections", get(get_sections).post(create_section))
}

pub fn init_sections_router() -> Router<AppState> {
    Router::new().route("/{id}", put(update_section).delete(delete_section))
}
