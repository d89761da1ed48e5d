use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    Class, ClassDetail, ClassFilterParams, CreateClassDto, CreateSectionDto, Section,
    SectionWithCount, UpdateClassDto, UpdateSectionDto,
};
use super::service::ClassService;

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Class teacher is not a teacher", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 409, description = "Duplicate name for the academic year", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, dto))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class = ClassService::create_class(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/classes",
    params(
        ("academic_year" = Option<String>, Query, description = "Filter by academic year"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of classes", body = Paginated<Class>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_classes(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ClassFilterParams>,
) -> Result<Json<Paginated<Class>>, AppError> {
    Ok(Json(ClassService::list_classes(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class with sections and headcount", body = ClassDetail),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_class(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassDetail>, AppError> {
    Ok(Json(ClassService::get_class_detail(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 409, description = "Duplicate name for the academic year", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, dto))]
pub async fn update_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    Ok(Json(ClassService::update_class(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 409, description = "Class has enrolled students", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_class(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/classes/{class_id}/sections",
    params(("class_id" = Uuid, Path, description = "Class ID")),
    request_body = CreateSectionDto,
    responses(
        (status = 201, description = "Section created", body = Section),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 409, description = "Duplicate section name", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, dto))]
pub async fn create_section(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(class_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateSectionDto>,
) -> Result<(StatusCode, Json<Section>), AppError> {
    let section = ClassService::create_section(&state.db, class_id, dto).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/sections",
    params(("class_id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Sections with headcounts", body = Vec<SectionWithCount>),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_sections(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<SectionWithCount>>, AppError> {
    ClassService::get_class(&state.db, class_id).await?;
    Ok(Json(ClassService::list_sections(&state.db, class_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/sections/{id}",
    params(("id" = Uuid, Path, description = "Section ID")),
    request_body = UpdateSectionDto,
    responses(
        (status = 200, description = "Section updated", body = Section),
        (status = 400, description = "Capacity below headcount", body = ErrorResponse),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, dto))]
pub async fn update_section(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSectionDto>,
) -> Result<Json<Section>, AppError> {
    Ok(Json(ClassService::update_section(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/sections/{id}",
    params(("id" = Uuid, Path, description = "Section ID")),
    responses(
        (status = 204, description = "Section deleted"),
        (status = 404, description = "Section not found", body = ErrorResponse),
        (status = 409, description = "Section has assigned students", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn delete_section(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_section(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
