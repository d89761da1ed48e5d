use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    change_password, create_user, delete_user, get_profile, get_user, get_users, update_profile,
    update_user, update_user_status,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/change-password", post(change_password))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/{id}/status", patch(update_user_status))
}
