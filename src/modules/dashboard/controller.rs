use axum::{Json, extract::State};
use campusly_core::AppError;
use tracing::instrument;

use crate::middleware::role::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

use super::model::DashboardStats;
use super::service::DashboardService;

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Headline numbers for the admin dashboard", body = DashboardStats),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(DashboardService::stats(&state.db).await?))
}
