use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::role::require_admin;
use crate::state::AppState;

use super::controller::{create_invite, get_invite, get_invites, revoke_invite, validate_invite};

pub fn init_invites_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", get(get_invites).post(create_invite))
        .route("/{id}", get(get_invite))
        .route("/{id}/revoke", post(revoke_invite))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/validate", get(validate_invite))
        .merge(admin_routes)
}
