use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    AssignStudentDto, CreateRouteDto, RouteAssignment, RouteFilterParams, RouteStudent,
    RouteWithCount, TransportRoute, UpdateRouteDto,
};
use super::service::TransportService;

#[utoipa::path(
    post,
    path = "/api/transport/routes",
    request_body = CreateRouteDto,
    responses(
        (status = 201, description = "Route created", body = TransportRoute),
        (status = 409, description = "Duplicate route name", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state, dto))]
pub async fn create_route(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateRouteDto>,
) -> Result<(StatusCode, Json<TransportRoute>), AppError> {
    let route = TransportService::create_route(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

#[utoipa::path(
    get,
    path = "/api/transport/routes",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of routes", body = Paginated<RouteWithCount>)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_routes(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<RouteFilterParams>,
) -> Result<Json<Paginated<RouteWithCount>>, AppError> {
    Ok(Json(TransportService::list_routes(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/transport/routes/{id}",
    params(("id" = Uuid, Path, description = "Route ID")),
    responses(
        (status = 200, description = "Route with assigned count", body = RouteWithCount),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_route(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteWithCount>, AppError> {
    Ok(Json(TransportService::get_route(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/transport/routes/{id}",
    params(("id" = Uuid, Path, description = "Route ID")),
    request_body = UpdateRouteDto,
    responses(
        (status = 200, description = "Route updated", body = RouteWithCount),
        (status = 400, description = "Capacity below assigned students", body = ErrorResponse),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state, dto))]
pub async fn update_route(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateRouteDto>,
) -> Result<Json<RouteWithCount>, AppError> {
    Ok(Json(TransportService::update_route(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/transport/routes/{id}",
    params(("id" = Uuid, Path, description = "Route ID")),
    responses(
        (status = 204, description = "Route deleted"),
        (status = 409, description = "Students still assigned", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state))]
pub async fn delete_route(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TransportService::delete_route(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/transport/routes/{id}/students",
    params(("id" = Uuid, Path, description = "Route ID")),
    request_body = AssignStudentDto,
    responses(
        (status = 201, description = "Student assigned", body = RouteAssignment),
        (status = 404, description = "Route or student not found", body = ErrorResponse),
        (status = 409, description = "Route is full", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state, dto))]
pub async fn assign_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignStudentDto>,
) -> Result<(StatusCode, Json<RouteAssignment>), AppError> {
    let assignment = TransportService::assign_student(&state.db, id, dto).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    delete,
    path = "/api/transport/routes/{id}/students/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Route ID"),
        ("student_id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Student unassigned"),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state))]
pub async fn unassign_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    TransportService::unassign_student(&state.db, id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/transport/routes/{id}/students",
    params(("id" = Uuid, Path, description = "Route ID")),
    responses(
        (status = 200, description = "Students on the route", body = Vec<RouteStudent>),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transport"
)]
#[instrument(skip(state))]
pub async fn get_route_students(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RouteStudent>>, AppError> {
    Ok(Json(TransportService::route_students(&state.db, id).await?))
}
