use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStaff;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    Announcement, AnnouncementFilterParams, CreateAnnouncementDto, UpdateAnnouncementDto,
};
use super::service::AnnouncementService;

#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = CreateAnnouncementDto,
    responses(
        (status = 201, description = "Announcement posted", body = Announcement),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 422, description = "expires_at not after publish_at", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state, staff, dto))]
pub async fn create_announcement(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateAnnouncementDto>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    let announcement = AnnouncementService::create(&state.db, staff.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

#[utoipa::path(
    get,
    path = "/api/announcements",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Announcements visible to the caller", body = Paginated<Announcement>)
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_announcements(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<AnnouncementFilterParams>,
) -> Result<Json<Paginated<Announcement>>, AppError> {
    Ok(Json(
        AnnouncementService::list(&state.db, auth_user.role()?, filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement", body = Announcement),
        (status = 404, description = "Not found or not visible", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, AppError> {
    Ok(Json(
        AnnouncementService::get(&state.db, auth_user.role()?, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    request_body = UpdateAnnouncementDto,
    responses(
        (status = 200, description = "Announcement updated", body = Announcement),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Announcement not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAnnouncementDto>,
) -> Result<Json<Announcement>, AppError> {
    Ok(Json(
        AnnouncementService::update(&state.db, &auth_user, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Announcement not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    AnnouncementService::delete(&state.db, &auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
