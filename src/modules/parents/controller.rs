use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use campusly_models::users::UserRole;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequireAdmin, check_any_role};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateParentDto, LinkChildDto, LinkedChild, Parent, ParentFilterParams, ParentWithChildren,
    UpdateParentDto,
};
use super::service::ParentService;

#[utoipa::path(
    post,
    path = "/api/parents",
    request_body = CreateParentDto,
    responses(
        (status = 201, description = "Parent created", body = Parent),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 409, description = "Email in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state, dto))]
pub async fn create_parent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateParentDto>,
) -> Result<(StatusCode, Json<Parent>), AppError> {
    let parent = ParentService::create_parent(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(parent)))
}

#[utoipa::path(
    get,
    path = "/api/parents",
    params(
        ("search" = Option<String>, Query, description = "Matches name or email"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of parents", body = Paginated<Parent>),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state))]
pub async fn get_parents(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filters): Query<ParentFilterParams>,
) -> Result<Json<Paginated<Parent>>, AppError> {
    Ok(Json(ParentService::list_parents(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent ID")),
    responses(
        (status = 200, description = "Parent with linked children", body = ParentWithChildren),
        (status = 404, description = "Parent not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state))]
pub async fn get_parent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ParentWithChildren>, AppError> {
    Ok(Json(
        ParentService::get_parent_with_children(&state.db, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent ID")),
    request_body = UpdateParentDto,
    responses(
        (status = 200, description = "Parent updated", body = Parent),
        (status = 404, description = "Parent not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state, dto))]
pub async fn update_parent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateParentDto>,
) -> Result<Json<Parent>, AppError> {
    Ok(Json(ParentService::update_parent(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent ID")),
    responses(
        (status = 204, description = "Parent deleted"),
        (status = 404, description = "Parent not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state))]
pub async fn delete_parent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ParentService::delete_parent(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Link a student to a parent
#[utoipa::path(
    post,
    path = "/api/parents/{id}/children",
    params(("id" = Uuid, Path, description = "Parent ID")),
    request_body = LinkChildDto,
    responses(
        (status = 201, description = "Child linked", body = ParentWithChildren),
        (status = 404, description = "Parent or student not found", body = ErrorResponse),
        (status = 409, description = "Already linked", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state, dto))]
pub async fn link_child(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<LinkChildDto>,
) -> Result<(StatusCode, Json<ParentWithChildren>), AppError> {
    let parent = ParentService::link_child(&state.db, id, dto).await?;
    Ok((StatusCode::CREATED, Json(parent)))
}

#[utoipa::path(
    delete,
    path = "/api/parents/{id}/children/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Parent ID"),
        ("student_id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Child unlinked"),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state))]
pub async fn unlink_child(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    ParentService::unlink_child(&state.db, id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Children linked to the calling parent
#[utoipa::path(
    get,
    path = "/api/parents/me/children",
    responses(
        (status = 200, description = "Linked children", body = Vec<LinkedChild>),
        (status = 403, description = "Forbidden - parents only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Parents"
)]
#[instrument(skip(state))]
pub async fn get_my_children(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<LinkedChild>>, AppError> {
    check_any_role(&auth_user, &[UserRole::Parent])?;
    Ok(Json(
        ParentService::get_my_children(&state.db, auth_user.user_id()?).await?,
    ))
}
