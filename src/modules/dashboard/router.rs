use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::get_stats;

pub fn init_dashboard_router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
